// src/pipeline/runner.rs

//! Loops around single passes: catch up with retries, or poll forever.

use std::time::Duration;

use tokio::sync::watch;

use super::processor::{CatalogProcessor, PassOutcome};
use crate::error::Result;
use crate::utils::log::pass_summary;

/// Retry whole passes until one completes.
///
/// Returns `Ok(None)` when shutdown arrives while waiting to retry, and the
/// last error once `max_attempts` failures have been seen.
pub async fn run_until_success(
    processor: &mut CatalogProcessor,
    retry_delay: Duration,
    max_attempts: Option<u32>,
) -> Result<Option<PassOutcome>> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match processor.run_one_pass().await {
            Ok(outcome) => {
                pass_summary("Catalog pass", outcome.summary());
                return Ok(Some(outcome));
            }
            Err(e) if max_attempts.is_some_and(|max| attempt >= max) => {
                log::error!("Giving up after {} attempts", attempt);
                return Err(e);
            }
            Err(e) => {
                log::warn!(
                    "Attempt {} failed: {}. Retrying in {}s",
                    attempt,
                    e,
                    retry_delay.as_secs()
                );
            }
        }

        if wait(retry_delay, processor.shutdown_signal()).await {
            log::info!("Shutdown requested, not retrying");
            return Ok(None);
        }
    }
}

/// Run a pass every `interval` until shutdown.
///
/// Failed passes are logged and picked up again on the next tick. Returns the
/// number of passes that completed.
pub async fn poll(processor: &mut CatalogProcessor, interval: Duration) -> usize {
    let mut completed = 0;
    loop {
        match processor.run_one_pass().await {
            Ok(outcome) => {
                pass_summary("Catalog pass", outcome.summary());
                if outcome.is_cancelled() {
                    break;
                }
                completed += 1;
            }
            Err(e) => log::error!("Pass failed, retrying next interval: {}", e),
        }

        if wait(interval, processor.shutdown_signal()).await {
            break;
        }
    }
    log::info!("Polling stopped after {} completed passes", completed);
    completed
}

/// Sleep for `duration`. Returns `true` if shutdown was requested first.
async fn wait(duration: Duration, shutdown: Option<watch::Receiver<bool>>) -> bool {
    let Some(mut rx) = shutdown else {
        tokio::time::sleep(duration).await;
        return false;
    };
    if *rx.borrow() {
        return true;
    }

    let stopped = async move {
        if rx.wait_for(|stop| *stop).await.is_err() {
            // Sender gone: no shutdown can arrive any more
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = stopped => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{CatalogIndex, CatalogLeaf, CatalogPage, LeafKind, ProcessorConfig};
    use crate::services::{CatalogClient, LoggingLeafProcessor};
    use crate::storage::MemoryCursor;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Empty catalog whose index fetch fails a fixed number of times.
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
        stop_on_call: Option<(usize, watch::Sender<bool>)>,
    }

    impl FlakyClient {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                stop_on_call: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogClient for FlakyClient {
        async fn get_index(&self) -> crate::error::Result<CatalogIndex> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((n, tx)) = &self.stop_on_call {
                if call == *n {
                    let _ = tx.send(true);
                }
            }
            if call <= self.failures {
                return Err(AppError::fetch("https://example.test/index.json", "timed out"));
            }
            Ok(CatalogIndex {
                url: None,
                commit_id: None,
                commit_timestamp: Utc::now(),
                count: 0,
                items: Vec::new(),
            })
        }

        async fn get_page(&self, url: &str) -> crate::error::Result<CatalogPage> {
            Err(AppError::fetch(url, "unexpected"))
        }

        async fn get_leaf(&self, url: &str, _kind: LeafKind) -> crate::error::Result<CatalogLeaf> {
            Err(AppError::fetch(url, "unexpected"))
        }
    }

    fn processor(client: Arc<FlakyClient>) -> CatalogProcessor {
        let settings = ProcessorConfig {
            default_min_commit_timestamp: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..ProcessorConfig::default()
        };
        CatalogProcessor::new(
            client,
            Arc::new(MemoryCursor::new()),
            Arc::new(LoggingLeafProcessor::new()),
            settings,
        )
    }

    #[tokio::test]
    async fn test_run_until_success_retries() {
        let client = Arc::new(FlakyClient::new(2));
        let mut processor = processor(client.clone());

        let outcome = run_until_success(&mut processor, Duration::from_millis(1), None)
            .await
            .unwrap();
        assert!(matches!(outcome, Some(PassOutcome::Completed(_))));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_run_until_success_gives_up() {
        let client = Arc::new(FlakyClient::new(5));
        let mut processor = processor(client.clone());

        let err = run_until_success(&mut processor, Duration::from_millis(1), Some(2))
            .await
            .unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_until_success_stops_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut client = FlakyClient::new(usize::MAX);
        client.stop_on_call = Some((1, tx));
        let client = Arc::new(client);
        let mut processor = processor(client.clone()).with_shutdown(rx);

        let outcome = run_until_success(&mut processor, Duration::from_secs(3600), None)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_poll_survives_failures_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut client = FlakyClient::new(1);
        client.stop_on_call = Some((3, tx));
        let client = Arc::new(client);
        let mut processor = processor(client.clone()).with_shutdown(rx);

        let completed = poll(&mut processor, Duration::from_millis(1)).await;
        assert_eq!(client.calls(), 3);
        assert_eq!(completed, 2);
    }

    #[tokio::test]
    async fn test_wait_without_shutdown_sleeps() {
        assert!(!wait(Duration::from_millis(1), None).await);

        let (tx, rx) = watch::channel(false);
        drop(tx);
        assert!(!wait(Duration::from_millis(1), Some(rx)).await);
    }
}
