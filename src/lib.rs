//! sitemap-indexer - Submit sitemap URLs to the Google Indexing API
//!
//! Reads the URLs declared by one or more sitemaps and announces each of them
//! as `URL_UPDATED` through the Indexing API, authenticating with a
//! service-account key.
//!
//! # Architecture
//!
//! - [`config`] - Configuration file, environment overrides and validation
//! - [`auth`] - Service-account credentials and access tokens
//! - [`sitemap`] - Sitemap fetching and `<loc>` extraction
//! - [`submission`] - Submission worker, worker pool coordinator and results
//! - [`error`] - Unified error type
//! - [`utils`] - Domain errors and small helpers
//!
//! # Example
//!
//! ```no_run
//! use sitemap_indexer::config::{Config, SitemapConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::from_env()?;
//!     config
//!         .sitemaps
//!         .push(SitemapConfig::new("https://example.com/sitemap.xml", 100));
//!
//!     let summary = sitemap_indexer::submission::execute(&config).await?;
//!     println!("{} ok, {} failed", summary.success, summary.failure);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod sitemap;
pub mod submission;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::{ServiceAccountCredentials, StaticToken, TokenProvider};
    pub use crate::config::{Config, SitemapConfig};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::sitemap::SitemapFetcher;
    pub use crate::submission::{
        NotificationType, RunSummary, SubmissionCoordinator, SubmissionResult, SubmissionWorker,
    };
}

pub use submission::{RunSummary, SubmissionResult};
