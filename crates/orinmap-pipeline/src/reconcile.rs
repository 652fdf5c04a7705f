//! Orphan reconciler: deletes objects left behind by failed uploads.

use std::time::Duration;

use orinmap_blob::BlobStore;
use orinmap_state::StateStore;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::PipelineResult;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: usize,
    /// Records cleared without deleting, because a committed row uses the key.
    pub retained: usize,
    pub failed: usize,
}

pub struct Reconciler {
    blobs: BlobStore,
    state: StateStore,
    interval: Duration,
}

impl Reconciler {
    pub fn new(blobs: BlobStore, state: StateStore, interval: Duration) -> Self {
        Self {
            blobs,
            state,
            interval,
        }
    }

    /// Delete every recorded orphan. A record is cleared only after its
    /// object is gone; failures stay recorded for the next sweep. Objects a
    /// committed map data row points at are never deleted.
    pub async fn sweep(&self) -> PipelineResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for orphan in self.state.list_orphans()? {
            if self.state.is_object_referenced(&orphan.key)? {
                self.state.delete_orphan(&orphan.key)?;
                report.retained += 1;
                warn!(key = %orphan.key, orin_id = %orphan.orin_id, "orphan key is in use, object kept");
                continue;
            }
            match self.blobs.delete(&orphan.key).await {
                Ok(()) => {
                    self.state.delete_orphan(&orphan.key)?;
                    report.removed += 1;
                    debug!(key = %orphan.key, orin_id = %orphan.orin_id, "orphan removed");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(key = %orphan.key, error = %e, "orphan delete failed");
                }
            }
        }

        if report != ReconcileReport::default() {
            info!(
                removed = report.removed,
                retained = report.retained,
                failed = report.failed,
                "orphan sweep finished"
            );
        }
        Ok(report)
    }

    /// Run the sweep loop until shutdown signal.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            info!("orphan reconciler disabled");
            return;
        }
        info!(interval_secs = self.interval.as_secs(), "orphan reconciler started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "orphan sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("orphan reconciler shutting down");
                    break;
                }
            }
        }
    }
}
