use std::future::Future;
use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::db::Repository;
use crate::ingest::IngestionCoordinator;

/// Daily retention sweep.
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Hourly summary backfill.
const BACKFILL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Bounded retry for scheduled jobs. Owned by the scheduler so the ingestion
/// logic itself stays retry-free.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, E, F, Fut>(&self, job: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        job,
                        attempt,
                        self.max_attempts,
                        e,
                        self.backoff
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Drives the periodic jobs: ingestion sweeps, the retention sweep and the
/// summary backfill. Every job catches and logs its own failure; nothing
/// escapes the loops.
pub struct Scheduler {
    coordinator: Arc<IngestionCoordinator>,
    repo: Arc<Repository>,
    fetch_interval: Duration,
    retention_days: i64,
    backfill_batch: u32,
    retry: RetryPolicy,
}

impl Scheduler {
    pub fn new(
        coordinator: Arc<IngestionCoordinator>,
        repo: Arc<Repository>,
        fetch_interval: Duration,
        retention_days: i64,
        backfill_batch: u32,
    ) -> Self {
        Self {
            coordinator,
            repo,
            fetch_interval,
            retention_days,
            backfill_batch,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run all periodic jobs; never returns on its own.
    pub async fn run(&self) {
        tracing::info!(
            "Scheduler started (ingestion every {}s, retention after {} days)",
            self.fetch_interval.as_secs(),
            self.retention_days
        );
        tokio::join!(
            self.ingest_loop(),
            self.retention_loop(),
            self.backfill_loop()
        );
    }

    async fn ingest_loop(&self) {
        let mut timer = interval(self.fetch_interval);
        loop {
            timer.tick().await;
            let result = self
                .retry
                .run("Ingestion sweep", || {
                    self.coordinator.ingest_all_active_sources()
                })
                .await;
            match result {
                Ok(sweep) => tracing::info!(
                    "Ingestion sweep complete: {} sources, {} entries, {} new articles",
                    sweep.sources,
                    sweep.fetched,
                    sweep.created
                ),
                Err(e) => tracing::error!("Ingestion sweep failed after retries: {}", e),
            }
        }
    }

    async fn retention_loop(&self) {
        let mut timer = interval(RETENTION_SWEEP_INTERVAL);
        loop {
            timer.tick().await;
            match self.repo.delete_articles_older_than(self.retention_days).await {
                Ok(0) => tracing::debug!("No old articles to clean up"),
                Ok(deleted) => tracing::info!("Cleaned up {} old articles", deleted),
                Err(e) => {
                    tracing::error!("Retention sweep failed, batch rolled back: {}", e)
                }
            }
        }
    }

    async fn backfill_loop(&self) {
        let mut timer = interval(BACKFILL_INTERVAL);
        loop {
            timer.tick().await;
            match self.coordinator.backfill_summaries(self.backfill_batch).await {
                Ok(0) => {}
                Ok(generated) => {
                    tracing::info!("Summary backfill generated {} summaries", generated)
                }
                Err(e) => tracing::warn!("Summary backfill failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        };
        let calls = Cell::new(0u32);

        let result: Result<u32, String> = policy
            .run("test job", || {
                let attempt = calls.get() + 1;
                calls.set(attempt);
                async move {
                    if attempt < 3 {
                        Err("transient".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        };
        let calls = Cell::new(0u32);

        let result: Result<(), String> = policy
            .run("test job", || {
                calls.set(calls.get() + 1);
                async { Err("permanent".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }
}
