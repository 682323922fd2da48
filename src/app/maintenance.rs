use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::MediaCache;

/// Outcome of one maintenance sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub stale_removed: usize,
    pub orphans_removed: usize,
}

/// Run one sweep: drop stale entries, then delete untracked files.
///
/// Errors are logged, never propagated; a failed step does not skip the next.
pub fn run_maintenance(cache: &MediaCache) -> MaintenanceReport {
    let mut report = MaintenanceReport::default();

    match cache.validate_integrity() {
        Ok(removed) => report.stale_removed = removed,
        Err(e) => warn!("Cache integrity check failed: {}", e),
    }

    match cache.cleanup_orphans() {
        Ok(removed) => report.orphans_removed = removed,
        Err(e) => warn!("Cache orphan cleanup failed: {}", e),
    }

    report
}

/// Run [`run_maintenance`] every `interval` on the blocking pool until the
/// returned handle is aborted. The first sweep happens one interval after start.
pub fn spawn_maintenance(cache: Arc<MediaCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let cache = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || run_maintenance(&cache)).await {
                Ok(report) => {
                    if report != MaintenanceReport::default() {
                        info!(
                            "Cache maintenance: {} stale entries, {} orphaned files removed",
                            report.stale_removed, report.orphans_removed
                        );
                    }
                }
                Err(e) => warn!("Cache maintenance task failed: {}", e),
            }
        }
    })
}
