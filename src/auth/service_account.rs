//! Service-account credentials (OAuth2 JWT bearer grant)
//!
//! The key file is the JSON document downloaded from the cloud console. A
//! token is obtained by signing an RS256 assertion with the embedded private
//! key and posting it to the key's `token_uri`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{AccessToken, TokenProvider};
use crate::config::IndexingConfig;
use crate::utils::error::CredentialError;

/// Default OAuth2 token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Grant type for the JWT bearer flow
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (the maximum Google accepts)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service-account key file contents
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,

    pub client_email: String,

    pub private_key: String,

    #[serde(default)]
    pub private_key_id: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read and parse a key file
    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&content)
    }

    /// Parse key JSON
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let key: Self = serde_json::from_str(json)?;

        if key.key_type != "service_account" {
            return Err(CredentialError::InvalidKeyType(key.key_type));
        }

        Ok(key)
    }
}

/// JWT claims for the bearer assertion
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Credentials backed by a service-account key
///
/// The cached token is refreshed lazily. Several workers finding it expired
/// at the same moment will each refresh; the extra tokens are simply
/// discarded.
pub struct ServiceAccountCredentials {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    client: Client,
    token: RwLock<Option<AccessToken>>,
}

impl ServiceAccountCredentials {
    /// Load the key at `path` and prepare a token source for `scope`
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the file is missing, is not a
    /// service-account key, or carries an unusable private key
    pub fn obtain(path: &Path, scope: &str, timeout: Duration) -> Result<Self, CredentialError> {
        let key = ServiceAccountKey::from_file(path)?;
        Self::from_key(key, scope, timeout)
    }

    /// Load the key, scope and timeout named by the `[indexing]` section
    pub fn from_config(config: &IndexingConfig) -> Result<Self, CredentialError> {
        Self::obtain(&config.key_file, &config.scope, config.request_timeout())
    }

    /// Build credentials from an already parsed key
    pub fn from_key(
        key: ServiceAccountKey,
        scope: &str,
        timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialError::InvalidPrivateKey(e.to_string()))?;

        let client = Client::builder().timeout(timeout).build()?;

        tracing::debug!(client_email = %key.client_email, scope, "Loaded service account key");

        Ok(Self {
            key,
            encoding_key,
            scope: scope.to_string(),
            client,
            token: RwLock::new(None),
        })
    }

    /// Service account identity
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Exchange a fresh assertion for a new access token and cache it
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unauthorized` if the token endpoint rejects
    /// the assertion, or another variant for transport and format failures
    pub async fn refresh(&self) -> Result<AccessToken, CredentialError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CredentialError::Unauthorized {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CredentialError::InvalidTokenResponse(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(CredentialError::InvalidTokenResponse(
                "empty access_token".to_string(),
            ));
        }

        let expires_in = parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let token = AccessToken::new(parsed.access_token, now, expires_in).ok_or_else(|| {
            CredentialError::InvalidTokenResponse(format!("expires_in out of range: {expires_in}"))
        })?;

        tracing::debug!(expires_at = %token.expires_at, "Refreshed access token");

        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Sign the JWT bearer assertion
    fn assertion(&self, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<String, CredentialError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        Ok(self.refresh().await?.token)
    }
}
