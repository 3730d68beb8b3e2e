//! Unified error handling for the sitemap indexer
//!
//! Domain errors live in [`crate::utils::error`]; this module wraps them into a
//! single [`Error`] enum for use across module boundaries.
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::utils::error::{CredentialError, FetchError, SubmissionError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential loading and token exchange
    Auth,
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// XML and JSON parsing errors
    Parsing,
    /// Log file and other I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Background task failures
    Other,
}

impl ErrorCategory {
    /// Short label used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Credential errors abort the run
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Sitemap fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Single submission errors
    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// A spawned task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Credential(_) | Self::Submission(SubmissionError::Credential(_)) => {
                ErrorCategory::Auth
            }
            Self::Fetch(FetchError::Parse { .. } | FetchError::Decode(_)) => ErrorCategory::Parsing,
            Self::Fetch(_) | Self::Submission(_) => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Task(_) => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
