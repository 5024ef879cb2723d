//! Stale job-queue worker reaper
//!
//! Workers that die mid-job leave their claim behind, and the queue runtime
//! will not hand that job to anyone else until the claim disappears. The
//! reaper periodically snapshots the worker registry and force-releases
//! claims that have been held past the staleness threshold.

use chibi_core::traits::WorkerRegistry;
use chibi_core::AppResult;
use chrono::{Duration, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

/// Releases claims held by stuck workers
///
/// Best-effort: a release failure for one worker is logged and skipped, the
/// pass continues with the rest.
pub struct StaleWorkerReaper<W> {
    registry: W,
    stale_after: Duration,
}

impl<W: WorkerRegistry> StaleWorkerReaper<W> {
    /// Create a reaper with the given staleness threshold in seconds
    pub fn new(registry: W, stale_after_secs: i64) -> Self {
        Self {
            registry,
            stale_after: Duration::seconds(stale_after_secs),
        }
    }

    /// Run one reap pass, returning the number of released claims
    #[instrument(skip(self))]
    pub async fn clean_stale_workers(&self) -> AppResult<usize> {
        let workers = self.registry.workers().await?;
        let now = Utc::now();

        let mut released = 0;
        for worker in &workers {
            if !worker.is_stale(now, self.stale_after) {
                continue;
            }

            info!("Releasing stale claim held by worker {}", worker.id);
            match self.registry.release_claim(&worker.id).await {
                Ok(()) => released += 1,
                Err(e) => {
                    error!("Failed to release claim for worker {}: {}", worker.id, e);
                }
            }
        }

        debug!(
            "Reap pass released {} of {} workers",
            released,
            workers.len()
        );
        Ok(released)
    }

    /// Run reap passes on a fixed interval until shutdown is signalled
    ///
    /// A failed pass is logged and the loop keeps going; the registry may
    /// simply be unreachable for a while.
    pub async fn run(&self, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("Stale worker reaper started (interval {:?})", interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.clean_stale_workers().await {
                        error!("Reap pass failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender means the server is gone; treat it
                    // like an explicit shutdown rather than spinning.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Stale worker reaper shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chibi_core::error::AppError;
    use chibi_core::models::{JobClaim, WorkerSnapshot};
    use chibi_queue::InMemoryWorkerRegistry;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn worker(id: &str, idle: bool, run_at_minutes_ago: Option<i64>) -> WorkerSnapshot {
        WorkerSnapshot {
            id: id.to_string(),
            idle,
            job: run_at_minutes_ago.map(|mins| JobClaim {
                run_at: Utc::now() - Duration::minutes(mins),
                payload: json!({"class": "CleanupJob"}),
            }),
        }
    }

    #[tokio::test]
    async fn test_reaps_only_stale_workers() {
        let registry = InMemoryWorkerRegistry::new();
        registry.insert(worker("idle-old", true, Some(120)));
        registry.insert(worker("busy-no-job", false, None));
        registry.insert(worker("busy-fresh", false, Some(9)));
        registry.insert(worker("busy-stale", false, Some(11)));

        let reaper = StaleWorkerReaper::new(registry, 600);
        let released = reaper.clean_stale_workers().await.unwrap();

        assert_eq!(released, 1);
        assert_eq!(
            reaper.registry.released_ids(),
            vec!["busy-stale".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_registry_releases_nothing() {
        let reaper = StaleWorkerReaper::new(InMemoryWorkerRegistry::new(), 600);
        assert_eq!(reaper.clean_stale_workers().await.unwrap(), 0);
    }

    /// Registry whose first release always fails
    struct FlakyRegistry {
        releases: AtomicUsize,
    }

    #[async_trait]
    impl WorkerRegistry for FlakyRegistry {
        async fn workers(&self) -> Result<Vec<WorkerSnapshot>, AppError> {
            Ok(vec![
                worker("stale-a", false, Some(30)),
                worker("stale-b", false, Some(30)),
            ])
        }

        async fn release_claim(&self, _worker_id: &str) -> Result<(), AppError> {
            if self.releases.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Queue("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_release_failure_does_not_block_the_pass() {
        let reaper = StaleWorkerReaper::new(
            FlakyRegistry {
                releases: AtomicUsize::new(0),
            },
            600,
        );

        let released = reaper.clean_stale_workers().await.unwrap();
        assert_eq!(released, 1);
        assert_eq!(reaper.registry.releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let reaper = StaleWorkerReaper::new(InMemoryWorkerRegistry::new(), 600);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            reaper.run(std::time::Duration::from_millis(10), rx).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_sender_dropped() {
        let reaper = StaleWorkerReaper::new(InMemoryWorkerRegistry::new(), 600);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        // The loop must exit rather than spin on the closed channel.
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            reaper.run(std::time::Duration::from_millis(10), rx),
        )
        .await
        .unwrap();
    }
}
