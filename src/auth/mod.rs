//! Access tokens for the Indexing API
//!
//! Workers ask a [`TokenProvider`] for a bearer token before every request.
//! The production source is [`ServiceAccountCredentials`], which signs a JWT
//! with a service-account key and exchanges it for a short-lived token,
//! caching it until shortly before expiry. [`StaticToken`] wraps a token
//! issued elsewhere (for example by `gcloud auth print-access-token`).

pub mod service_account;

pub use service_account::{ServiceAccountCredentials, ServiceAccountKey};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::utils::error::CredentialError;

/// Tokens are treated as expired this long before their actual expiry
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Source of bearer tokens shared by all submission workers
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token that is valid for at least the next request
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// A bearer token and the instant it stops being accepted
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token expiring `expires_in_secs` after `issued_at`
    ///
    /// Returns `None` when the expiry falls outside the representable range.
    pub fn new(
        token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in_secs: i64,
    ) -> Option<Self> {
        let expires_at = Duration::try_seconds(expires_in_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))?;

        Some(Self {
            token: token.into(),
            expires_at,
        })
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Pre-issued token used as-is
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}
