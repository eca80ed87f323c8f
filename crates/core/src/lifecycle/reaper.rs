//! Periodic reclamation of expired artifacts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::FileRegistry;
use crate::metrics::{ARTIFACTS_REAPED, REAPER_DELETE_FAILURES, REAPER_SWEEPS};
use crate::storage::{remove_file, Removal};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired files that were deleted.
    pub reclaimed: Vec<PathBuf>,
    /// Expired files that were already gone.
    pub missing: Vec<PathBuf>,
    /// Expired files whose deletion failed.
    pub failed: Vec<PathBuf>,
}

impl SweepReport {
    /// Number of registry entries this sweep removed.
    pub fn expired_count(&self) -> usize {
        self.reclaimed.len() + self.missing.len() + self.failed.len()
    }
}

/// Deletes expired artifacts on a fixed cadence.
pub struct Reaper {
    registry: Arc<FileRegistry>,
    interval: Duration,
}

impl Reaper {
    pub fn new(registry: Arc<FileRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Runs a single sweep against `now`.
    ///
    /// Deletion failures are logged and reported but never returned as an
    /// error; the entry is already gone from the registry either way.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepReport {
        let expired = self.registry.sweep_expired(now);
        REAPER_SWEEPS.inc();

        let mut report = SweepReport::default();
        for path in expired {
            match remove_file(&path).await {
                Ok(Removal::Removed) => {
                    debug!(path = %path.display(), "Reclaimed expired artifact");
                    ARTIFACTS_REAPED.inc();
                    report.reclaimed.push(path);
                }
                Ok(Removal::Missing) => {
                    debug!(path = %path.display(), "Expired artifact already removed");
                    report.missing.push(path);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to delete expired artifact");
                    REAPER_DELETE_FAILURES.inc();
                    report.failed.push(path);
                }
            }
        }

        if report.expired_count() > 0 {
            info!(
                reclaimed = report.reclaimed.len(),
                missing = report.missing.len(),
                failed = report.failed.len(),
                remaining = self.registry.len(),
                "Reaper sweep finished"
            );
        }

        report
    }

    /// Spawns the sweep loop on the current runtime.
    ///
    /// The first sweep runs one interval after spawning. The next tick is only
    /// awaited once the previous sweep has finished, so sweeps never overlap.
    pub fn spawn(self) -> ReaperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            info!(interval_secs = self.interval.as_secs_f64(), "Reaper started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Reaper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.sweep_once(Utc::now()).await;
                    }
                }
            }
        });

        ReaperHandle { cancel, task }
    }
}

/// Handle to a running reaper.
pub struct ReaperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Token that stops the reaper when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops rescheduling and waits for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Reaper task ended abnormally");
        }
    }
}
