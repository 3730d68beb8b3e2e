//! Sitemap-by-sitemap submission over a fixed worker pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sitemap   │     │  Submission │     │   Result    │
//! │   Fetcher   │────▶│   Workers   │────▶│  Collector  │──▶ log file + totals
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    one sitemap       mpsc channel        mpsc channel
//!     at a time       (N pool tasks)       (single task)
//! ```
//!
//! Each sitemap's batch drains completely before the next sitemap is
//! fetched. The collector is the only owner of the log file and counters, so
//! no lock guards them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{RunSummary, SubmissionResult, SubmissionWorker};
use crate::auth::TokenProvider;
use crate::config::{Config, SitemapConfig};
use crate::error::Result;
use crate::sitemap::SitemapFetcher;

/// Result channel capacity
const RESULT_BUFFER_SIZE: usize = 1000;

/// Message from the coordinator to a pool task
#[derive(Debug, Clone)]
struct SubmitJob {
    /// URL to submit
    url: String,

    /// Position within the batch, for tracing
    job_id: u64,
}

/// Keep the first `max_urls` URLs in document order
pub fn select_urls(mut urls: Vec<String>, max_urls: usize) -> Vec<String> {
    urls.truncate(max_urls);
    urls
}

/// Drives fetch → truncate → submit for every configured sitemap
pub struct SubmissionCoordinator {
    fetcher: SitemapFetcher,
    worker: Arc<SubmissionWorker>,
    workers: usize,
    log_path: PathBuf,
}

impl SubmissionCoordinator {
    /// Create a coordinator with an explicit pool size and log path
    pub fn new(
        fetcher: SitemapFetcher,
        worker: SubmissionWorker,
        workers: usize,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            worker: Arc::new(worker),
            workers: workers.max(1),
            log_path: log_path.into(),
        }
    }

    /// Create a coordinator from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| crate::error::Error::config(format!("{e:#}")))?;

        let fetcher = SitemapFetcher::from_config(&config.fetcher)?;
        let worker = SubmissionWorker::from_config(&config.indexing)?;

        Ok(Self::new(
            fetcher,
            worker,
            config.indexing.workers,
            config.output.log_file.clone(),
        ))
    }

    /// Submission log location
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Submit every sitemap in listed order and return the totals
    ///
    /// # Errors
    ///
    /// Only failing to create the log file or losing the result collector is
    /// an error; fetch and submission failures are logged and counted.
    pub async fn run(
        &self,
        sitemaps: &[SitemapConfig],
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<RunSummary> {
        let file = tokio::fs::File::create(&self.log_path).await?;

        tracing::info!(
            sitemaps = sitemaps.len(),
            workers = self.workers,
            log_file = %self.log_path.display(),
            "Starting submission run"
        );

        let (result_tx, result_rx) = mpsc::channel::<SubmissionResult>(RESULT_BUFFER_SIZE);
        let collector = spawn_collector(file, result_rx);

        for sitemap in sitemaps {
            let urls = self.fetcher.fetch_or_empty(&sitemap.url).await;
            if urls.is_empty() {
                tracing::info!(sitemap = %sitemap.url, "No URLs found in sitemap");
                println!("No URLs found in sitemap: {}", sitemap.url);
                continue;
            }

            let found = urls.len();
            let batch = select_urls(urls, sitemap.max_urls);

            tracing::info!(
                sitemap = %sitemap.url,
                found,
                submitting = batch.len(),
                "Submitting sitemap URLs"
            );

            self.submit_batch(batch, Arc::clone(&tokens), &result_tx).await;
        }

        drop(result_tx);
        let summary = await_summary(collector).await?;

        tracing::info!(
            success = summary.success,
            failed = summary.failure,
            "Submission run completed"
        );

        Ok(summary)
    }

    /// Fetch and truncate every sitemap without submitting anything
    pub async fn list(&self, sitemaps: &[SitemapConfig]) -> Vec<(SitemapConfig, Vec<String>)> {
        let mut listed = Vec::with_capacity(sitemaps.len());

        for sitemap in sitemaps {
            let urls = self.fetcher.fetch_or_empty(&sitemap.url).await;
            listed.push((sitemap.clone(), select_urls(urls, sitemap.max_urls)));
        }

        listed
    }

    /// Run one batch through the pool and wait for every job to finish
    async fn submit_batch(
        &self,
        urls: Vec<String>,
        tokens: Arc<dyn TokenProvider>,
        result_tx: &mpsc::Sender<SubmissionResult>,
    ) {
        let (job_tx, job_rx) = mpsc::channel::<SubmitJob>(urls.len().max(1));
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let pool_size = self.workers.min(urls.len()).max(1);

        let handles: Vec<JoinHandle<()>> = (0..pool_size)
            .map(|worker_id| {
                self.spawn_pool_task(
                    worker_id,
                    Arc::clone(&job_rx),
                    Arc::clone(&tokens),
                    result_tx.clone(),
                )
            })
            .collect();

        for (idx, url) in urls.into_iter().enumerate() {
            let job = SubmitJob {
                url,
                job_id: idx as u64,
            };

            if job_tx.send(job).await.is_err() {
                tracing::error!("Failed to send submit job - channel closed");
                break;
            }
        }

        // Close the job channel so idle tasks exit
        drop(job_tx);

        for outcome in futures::future::join_all(handles).await {
            if let Err(e) = outcome {
                tracing::error!(error = %e, "Submission task panicked");
            }
        }
    }

    fn spawn_pool_task(
        &self,
        worker_id: usize,
        job_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<SubmitJob>>>,
        tokens: Arc<dyn TokenProvider>,
        result_tx: mpsc::Sender<SubmissionResult>,
    ) -> JoinHandle<()> {
        let worker = Arc::clone(&self.worker);

        tokio::spawn(async move {
            loop {
                let job = {
                    let mut rx = job_rx.lock().await;
                    rx.recv().await
                };

                let job = match job {
                    Some(j) => j,
                    None => break,
                };

                tracing::debug!(worker_id, job_id = job.job_id, url = %job.url, "Submitting");

                let result = worker.submit(&job.url, tokens.as_ref()).await;

                if result_tx.send(result).await.is_err() {
                    tracing::error!("Result channel closed");
                    break;
                }
            }

            tracing::debug!(worker_id, "Submission task shutting down");
        })
    }
}

/// Wait for the collector to drain the result channel
async fn await_summary(collector: JoinHandle<RunSummary>) -> Result<RunSummary> {
    collector.await.map_err(|e| {
        tracing::error!(error = %e, "Result collector failed");
        e.into()
    })
}

/// Single consumer that owns the log file and the counters
fn spawn_collector(
    file: tokio::fs::File,
    mut result_rx: mpsc::Receiver<SubmissionResult>,
) -> JoinHandle<RunSummary> {
    tokio::spawn(async move {
        let mut writer = BufWriter::new(file);
        let mut summary = RunSummary::default();

        while let Some(result) = result_rx.recv().await {
            summary.record(&result);

            if result.is_success() {
                tracing::debug!(url = %result.url, status = ?result.status, "Submission succeeded");
            } else {
                tracing::warn!(url = %result.url, status = ?result.status, "Submission rejected");
            }

            println!("{}", result.console_line());

            if let Err(e) = writer.write_all(result.log_line().as_bytes()).await {
                tracing::error!(url = %result.url, error = %e, "Failed to write submission log");
            }
        }

        if let Err(e) = writer.flush().await {
            tracing::error!(error = %e, "Failed to flush submission log");
        }

        summary
    })
}
