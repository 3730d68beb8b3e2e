//! Indexing API client
//!
//! Sends one `urlNotifications:publish` request per URL. Failures never
//! propagate: a transport or token error becomes a [`SubmissionResult`]
//! without a status, and a non-2xx response keeps its status and body. A
//! body that cannot be read keeps the status with the read error as detail.
//! There is no retry.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Client,
};
use std::num::NonZeroU32;
use std::time::Duration;

use super::{NotificationType, SubmissionResult, UrlNotification};
use crate::auth::TokenProvider;
use crate::config::IndexingConfig;
use crate::utils::error::SubmissionError;

/// Indexing API publisher shared by all pool tasks
pub struct SubmissionWorker {
    /// HTTP client with configured timeout
    client: Client,

    /// Publish endpoint
    endpoint: String,

    /// Optional pacing shared across every request
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl SubmissionWorker {
    /// Create a worker posting to `endpoint`
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Http` if the HTTP client cannot be created
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            rate_limiter: None,
        })
    }

    /// Create a worker from the `[indexing]` config section
    pub fn from_config(config: &IndexingConfig) -> Result<Self, SubmissionError> {
        let worker = Self::new(&config.endpoint, config.request_timeout())?;
        Ok(worker.with_rate_limit(config.requests_per_second))
    }

    /// Limit requests per second across all callers; 0 leaves it unlimited
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = NonZeroU32::new(requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        self
    }

    /// Publish endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Announce that `url` was updated
    pub async fn submit(&self, url: &str, tokens: &dyn TokenProvider) -> SubmissionResult {
        self.publish(url, NotificationType::UrlUpdated, tokens).await
    }

    /// Send a notification of any type for `url`
    pub async fn publish(
        &self,
        url: &str,
        notification_type: NotificationType,
        tokens: &dyn TokenProvider,
    ) -> SubmissionResult {
        match self.try_publish(url, notification_type, tokens).await {
            Ok((status, body)) => {
                tracing::debug!(url = %url, status, "Submission answered");
                SubmissionResult::response(url, status, body)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Submission failed");
                SubmissionResult::error(url, e)
            }
        }
    }

    async fn try_publish(
        &self,
        url: &str,
        notification_type: NotificationType,
        tokens: &dyn TokenProvider,
    ) -> Result<(u16, String), SubmissionError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let token = tokens.access_token().await?;
        let body = UrlNotification::new(url, notification_type);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await
            .map_err(SubmissionError::from_transport)?;

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let e = SubmissionError::from_transport(e);
                tracing::warn!(url = %url, status, error = %e, "Failed to read response body");
                e.to_string()
            }
        };

        Ok((status, text))
    }
}
