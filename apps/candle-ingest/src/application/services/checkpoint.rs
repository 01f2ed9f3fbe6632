//! Snapshot Checkpointer
//!
//! Periodically persists the aggregator's working state through the snapshot
//! repository, and once more on shutdown. A failed periodic save is logged
//! and that checkpoint attempt abandoned; the shutdown save propagates its
//! failure to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{SnapshotError, SnapshotRepository, SnapshotSource};

/// Drives periodic and shutdown persistence of the aggregator state.
pub struct SnapshotCheckpointer {
    source: Arc<dyn SnapshotSource>,
    repository: Arc<dyn SnapshotRepository>,
    interval: Duration,
    cancel: CancellationToken,
}

impl SnapshotCheckpointer {
    /// Create a checkpointer saving every `interval` until `cancel` fires.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        repository: Arc<dyn SnapshotRepository>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            repository,
            interval,
            cancel,
        }
    }

    /// Run until cancelled, then perform the final save.
    ///
    /// # Errors
    ///
    /// Returns the error of the shutdown save; periodic save failures are
    /// logged and swallowed.
    pub async fn run(self) -> Result<(), SnapshotError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick fires immediately; nothing to save yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.save().await?;
                    tracing::info!("Final snapshot saved on shutdown");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.save().await {
                        tracing::error!(error = %e, "Snapshot checkpoint failed");
                    }
                }
            }
        }
    }

    async fn save(&self) -> Result<(), SnapshotError> {
        let snapshot = self.source.snapshot();
        let assets = snapshot.len();
        self.repository.save(&snapshot).await?;
        tracing::debug!(assets, "Aggregator state checkpointed");
        Ok(())
    }
}
