//! Sitemap fetching
//!
//! Downloads sitemap documents with a fixed User-Agent and returns the URLs
//! they declare. A sitemap that cannot be fetched or parsed is skipped by the
//! coordinator rather than aborting the run.

pub mod parser;

pub use parser::{decode_body, extract_locs};

use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

use crate::config::FetcherConfig;
use crate::utils::error::FetchError;

/// HTTP fetcher for sitemap documents
pub struct SitemapFetcher {
    /// HTTP client with the configured User-Agent and timeout
    client: Client,
}

impl SitemapFetcher {
    /// Create a fetcher sending `user_agent` on every request
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    /// Create a fetcher from the `[fetcher]` config section
    pub fn from_config(config: &FetcherConfig) -> Result<Self, FetchError> {
        Self::new(&config.user_agent, config.request_timeout())
    }

    /// Fetch a sitemap and return its `loc` entries in document order
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Status` for any non-2xx response, and other
    /// variants for transport, decoding and XML errors
    pub async fn fetch(&self, url: &str) -> Result<Vec<String>, FetchError> {
        tracing::debug!(url = %url, "Fetching sitemap");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_transport)?;

        let xml = decode_body(&bytes, &content_type)?;
        let urls = extract_locs(&xml)?;

        tracing::debug!(url = %url, count = urls.len(), "Parsed sitemap");
        Ok(urls)
    }

    /// Fetch a sitemap, logging any failure and returning no URLs instead
    pub async fn fetch_or_empty(&self, url: &str) -> Vec<String> {
        match self.fetch(url).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch sitemap, skipping");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_fetcher_creation() {
        let fetcher = SitemapFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(10));
        assert!(fetcher.is_ok());

        let fetcher = SitemapFetcher::from_config(&FetcherConfig::default());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_empty() {
        let fetcher = SitemapFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(2)).unwrap();
        let urls = fetcher.fetch_or_empty("http://127.0.0.1:9/sitemap.xml").await;
        assert!(urls.is_empty());
    }
}
