//! # Bounded Fetch Pool
//!
//! Runs N concurrent extraction jobs against a queue of URLs, enforcing a
//! per-job timeout and a global worker cap, yielding results as they
//! complete.
//!
//! ## Contract
//!
//! - Exactly `concurrency` jobs are in flight whenever work remains; when one
//!   completes, the next queued URL is dispatched immediately.
//! - Dispatch follows input order; completion order is unspecified. Callers
//!   correlate through the `index` carried on each [`FetchOutcome`].
//! - A timed-out or errored job counts as completed-with-failure and never
//!   blocks the pool.
//! - A pool is consumed by one batch; create a fresh pool per batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memex_core::types::ExtractedContent;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

/// The abstract "extract(url) -> result" capability the pool schedules.
///
/// `Ok(None)` is the extractor's normal skip signal (no article / too short);
/// `Err` is a transport or extraction failure. Both count as a completed job.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<ExtractedContent>, anyhow::Error>;
}

/// Pool sizing and per-job timeout.
#[derive(Debug, Clone, Copy)]
pub struct FetchPoolConfig {
    pub concurrency: usize,
    pub job_timeout: Duration,
}

impl Default for FetchPoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            job_timeout: Duration::from_secs(10),
        }
    }
}

/// Terminal state of one job.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Position of the URL in the input batch.
    pub index: usize,
    pub url: String,
    pub success: bool,
    pub content: Option<ExtractedContent>,
}

/// One-shot scheduler over a [`Fetcher`].
pub struct FetchPool {
    fetcher: Arc<dyn Fetcher>,
    config: FetchPoolConfig,
}

impl FetchPool {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: FetchPoolConfig) -> Self {
        Self { fetcher, config }
    }

    /// Dispatches every URL through the pool and returns the receiving end of
    /// the result stream. The channel yields exactly one [`FetchOutcome`] per
    /// input URL, then closes.
    pub fn fetch_all(self, urls: Vec<String>) -> mpsc::Receiver<FetchOutcome> {
        // Capacity = batch size, so workers never block on a slow consumer.
        let (tx, rx) = mpsc::channel(urls.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let fetcher = self.fetcher;
        let job_timeout = self.config.job_timeout;

        tokio::spawn(async move {
            for (index, url) in urls.into_iter().enumerate() {
                // Acquiring before spawning keeps dispatch in input order.
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    // Closed semaphore means the runtime is shutting down.
                    Err(_) => break,
                };
                let fetcher = fetcher.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let outcome = match tokio::time::timeout(job_timeout, fetcher.fetch(&url)).await
                    {
                        Ok(Ok(Some(content))) => FetchOutcome {
                            index,
                            url,
                            success: true,
                            content: Some(content),
                        },
                        Ok(Ok(None)) => {
                            debug!(index, url = %url, "extraction skipped (no article)");
                            FetchOutcome {
                                index,
                                url,
                                success: false,
                                content: None,
                            }
                        }
                        Ok(Err(e)) => {
                            warn!(index, url = %url, error = %e, "fetch job failed");
                            FetchOutcome {
                                index,
                                url,
                                success: false,
                                content: None,
                            }
                        }
                        Err(_) => {
                            warn!(index, url = %url, timeout_ms = job_timeout.as_millis() as u64, "fetch job timed out");
                            FetchOutcome {
                                index,
                                url,
                                success: false,
                                content: None,
                            }
                        }
                    };
                    drop(permit);
                    let _ = tx.send(outcome).await;
                });
            }
        });

        rx
    }
}
