//! Configuration management for the sitemap indexer
//!
//! This module handles loading and validating configuration from a TOML file,
//! environment variables, and command-line overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::utils::parse_http_url;

/// Google Indexing API publish endpoint
pub const DEFAULT_ENDPOINT: &str = "https://indexing.googleapis.com/v3/urlNotifications:publish";

/// OAuth2 scope restricted to the Indexing API
pub const INDEXING_SCOPE: &str = "https://www.googleapis.com/auth/indexing";

/// Browser User-Agent sent with sitemap requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Cap applied to a sitemap given without an explicit maximum
pub const DEFAULT_MAX_URLS: usize = 100;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Indexing API and credential configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Sitemap fetcher configuration
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Submission log output
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sitemaps processed in listed order
    #[serde(default)]
    pub sitemaps: Vec<SitemapConfig>,
}

/// Indexing API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Path to the service-account JSON key
    pub key_file: PathBuf,

    /// Publish endpoint
    pub endpoint: String,

    /// OAuth2 scope requested for the access token
    pub scope: String,

    /// Size of the submission worker pool
    pub workers: usize,

    /// Client-side pacing across all workers, 0 disables it
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Sitemap fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Submission log, overwritten each run
    pub log_file: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

/// One sitemap and the maximum number of its URLs to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Sitemap document URL
    pub url: String,

    /// Maximum URLs to submit, first in document order
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,
}

fn default_max_urls() -> usize {
    DEFAULT_MAX_URLS
}

impl SitemapConfig {
    /// Create a sitemap entry
    pub fn new(url: impl Into<String>, max_urls: usize) -> Self {
        Self {
            url: url.into(),
            max_urls,
        }
    }
}

/// Parses `URL` or `URL,MAX`
impl FromStr for SitemapConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (url, max_urls) = match s.rsplit_once(',') {
            Some((url, max)) => {
                let max = max
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid maximum in sitemap spec: {s}"))?;
                (url.trim(), max)
            }
            None => (s.trim(), DEFAULT_MAX_URLS),
        };

        parse_http_url(url)?;
        Ok(Self::new(url, max_urls))
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("key.json"),
            endpoint: String::from(DEFAULT_ENDPOINT),
            scope: String::from(INDEXING_SCOPE),
            workers: 10,
            requests_per_second: 0,
            request_timeout_secs: 30,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: String::from(DEFAULT_USER_AGENT),
            request_timeout_secs: 30,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("submission_log.txt"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `SITEMAP_INDEXER_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("SITEMAP_INDEXER_KEY_FILE") {
            self.indexing.key_file = PathBuf::from(path);
        }

        if let Ok(workers) = std::env::var("SITEMAP_INDEXER_WORKERS") {
            self.indexing.workers = workers
                .parse::<usize>()
                .context("SITEMAP_INDEXER_WORKERS must be a positive integer")?;
        }

        if let Ok(endpoint) = std::env::var("SITEMAP_INDEXER_ENDPOINT") {
            self.indexing.endpoint = endpoint;
        }

        if let Ok(log_file) = std::env::var("SITEMAP_INDEXER_LOG_FILE") {
            self.output.log_file = PathBuf::from(log_file);
        }

        if let Ok(user_agent) = std::env::var("SITEMAP_INDEXER_USER_AGENT") {
            self.fetcher.user_agent = user_agent;
        }

        if let Ok(level) = std::env::var("SITEMAP_INDEXER_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("SITEMAP_INDEXER_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.indexing.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }

        if self.indexing.request_timeout_secs == 0 || self.fetcher.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        parse_http_url(&self.indexing.endpoint).context("Invalid indexing endpoint")?;

        for sitemap in &self.sitemaps {
            parse_http_url(&sitemap.url).context("Invalid sitemap URL")?;
        }

        Ok(())
    }
}

impl IndexingConfig {
    /// Timeout for token exchange and publish requests
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FetcherConfig {
    /// Timeout for sitemap requests
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indexing.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.output.log_file, PathBuf::from("submission_log.txt"));
    }

    #[test]
    fn test_zero_workers_is_invalid() {
        let mut config = Config::default();
        config.indexing.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_sitemap_is_invalid() {
        let mut config = Config::default();
        config.sitemaps.push(SitemapConfig::new("/sitemap.xml", 10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sitemap_spec_parsing() {
        let spec: SitemapConfig = "https://example.com/sitemap.xml,25".parse().unwrap();
        assert_eq!(spec, SitemapConfig::new("https://example.com/sitemap.xml", 25));

        let spec: SitemapConfig = "https://example.com:8080/sitemap.xml".parse().unwrap();
        assert_eq!(spec.url, "https://example.com:8080/sitemap.xml");
        assert_eq!(spec.max_urls, DEFAULT_MAX_URLS);

        assert!("https://example.com/sitemap.xml,many".parse::<SitemapConfig>().is_err());
        assert!("sitemap.xml".parse::<SitemapConfig>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [indexing]
            workers = 5

            [[sitemaps]]
            url = "https://example.com/sitemap.xml"
            "#,
        )
        .unwrap();

        assert_eq!(config.indexing.workers, 5);
        assert_eq!(config.indexing.key_file, PathBuf::from("key.json"));
        assert_eq!(config.sitemaps.len(), 1);
        assert_eq!(config.sitemaps[0].max_urls, DEFAULT_MAX_URLS);
    }

    #[test]
    fn test_timeout_conversion() {
        let mut config = Config::default();
        config.fetcher.request_timeout_secs = 12;

        assert_eq!(config.indexing.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.fetcher.request_timeout(), Duration::from_secs(12));
    }
}
