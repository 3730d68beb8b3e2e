//! Error types for the sitemap indexer
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while loading service-account credentials or
/// exchanging them for an access token
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Key file could not be read
    #[error("Failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Key file is not valid service-account JSON
    #[error("Malformed key file: {0}")]
    MalformedKey(#[from] serde_json::Error),

    /// Key file describes something other than a service account
    #[error("Key file is not a service account key (type: {0})")]
    InvalidKeyType(String),

    /// The embedded private key could not be parsed
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Signing the JWT assertion failed
    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Token endpoint could not be reached
    #[error("Token request failed: {0}")]
    TokenRequest(#[from] reqwest::Error),

    /// Token endpoint rejected the assertion
    #[error("Token request unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// Token endpoint answered with something we cannot use
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),
}

/// Errors that can occur while fetching and parsing a sitemap
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// XML parsing error
    #[error("XML parse error at position {position}: {message}")]
    Parse { position: u64, message: String },
}

/// Errors that can occur while submitting a single URL notification
///
/// These never escape the worker: they are folded into a
/// [`SubmissionResult`](crate::submission::SubmissionResult) without a status.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// No access token could be obtained
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,
}

impl FetchError {
    /// Map a transport error, singling out timeouts
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl SubmissionError {
    /// Map a transport error, singling out timeouts
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}
