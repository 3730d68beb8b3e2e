//! URL notification submission
//!
//! - [`worker`] - one POST per URL to the Indexing API
//! - [`coordinator`] - per-sitemap batches over a fixed worker pool

pub mod coordinator;
pub mod worker;

pub use coordinator::{select_urls, SubmissionCoordinator};
pub use worker::SubmissionWorker;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::auth::{ServiceAccountCredentials, TokenProvider};
use crate::config::{Config, IndexingConfig};
use crate::error::Result;
use crate::utils::error::CredentialError;
use crate::utils::{normalize_whitespace, truncate_text};

/// Verb written at the start of every log line
pub const LOG_ACTION: &str = "Submitted";

/// Detail length kept on console lines; the log file keeps everything
const CONSOLE_DETAIL_CHARS: usize = 200;

/// Kind of change being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Page was added or changed
    UrlUpdated,
    /// Page was removed
    UrlDeleted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlUpdated => "URL_UPDATED",
            Self::UrlDeleted => "URL_DELETED",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `urlNotifications:publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlNotification {
    pub url: String,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,
}

impl UrlNotification {
    pub fn new(url: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            url: url.into(),
            notification_type,
        }
    }
}

/// Outcome of one submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Submitted URL
    pub url: String,

    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,

    /// Response body, or the error text when there is no status
    pub detail: String,
}

impl SubmissionResult {
    /// Result carrying an HTTP response
    pub fn response(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            detail: body.into(),
        }
    }

    /// Result for a request that never got a response
    pub fn error(url: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            url: url.into(),
            status: None,
            detail: error.to_string(),
        }
    }

    /// Only a 2xx response counts as success
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(status) if (200..300).contains(&status))
    }

    /// Status column: the HTTP code or `ERROR`
    pub fn status_label(&self) -> String {
        self.status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "ERROR".to_string())
    }

    /// Line appended to the submission log, newline included
    pub fn log_line(&self) -> String {
        format!(
            "{LOG_ACTION} {}: {} - {}\n",
            self.url,
            self.status_label(),
            normalize_whitespace(&self.detail)
        )
    }

    /// Shortened line printed to the console
    pub fn console_line(&self) -> String {
        format!(
            "{LOG_ACTION} {}: {} - {}",
            self.url,
            self.status_label(),
            truncate_text(&normalize_whitespace(&self.detail), CONSOLE_DETAIL_CHARS)
        )
    }
}

/// Success and failure totals for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success: u64,
    pub failure: u64,
}

impl RunSummary {
    /// Count one result
    pub fn record(&mut self, result: &SubmissionResult) {
        if result.is_success() {
            self.success += 1;
        } else {
            self.failure += 1;
        }
    }

    /// Number of attempted submissions
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

/// Load the service-account key and prove it can mint a token
///
/// # Errors
///
/// Returns `CredentialError` if the key is missing, malformed, or rejected
/// by the token endpoint
pub async fn load_credentials(
    config: &IndexingConfig,
) -> std::result::Result<Arc<dyn TokenProvider>, CredentialError> {
    let credentials = ServiceAccountCredentials::from_config(config)?;
    credentials.refresh().await?;

    tracing::info!(client_email = %credentials.client_email(), "Credentials ready");
    Ok(Arc::new(credentials))
}

/// Obtain credentials, then submit every configured sitemap
///
/// A credential failure returns before any sitemap is fetched.
pub async fn execute(config: &Config) -> Result<RunSummary> {
    let tokens = load_credentials(&config.indexing).await?;
    let coordinator = SubmissionCoordinator::from_config(config)?;
    coordinator.run(&config.sitemaps, tokens).await
}
