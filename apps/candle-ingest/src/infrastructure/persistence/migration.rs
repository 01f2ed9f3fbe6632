//! Migration-Aware Snapshot Repository
//!
//! Composes the snapshot formats as an ordered chain of readers. Reads try
//! the current format first and fall back format by format, logging each
//! fallback taken; writes always go to the current format only, so the
//! migration is one-way: once a current-format snapshot exists, older
//! formats are never consulted again.
//!
//! Absence from every format is a cold start, not an error. A blob that
//! exists but fails to decode propagates as an error instead of falling
//! through, so corruption is never papered over by stale legacy state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{
    SnapshotError, SnapshotReader, SnapshotRepository,
};
use crate::domain::market_state::MarketStateSnapshot;
use crate::infrastructure::persistence::legacy::LegacyMarketStateSnapshotStore;
use crate::infrastructure::persistence::snapshot::MarketStateSnapshotStore;

/// Snapshot repository resolving reads through a format fallback chain.
pub struct MigrationSnapshotRepository {
    current: Arc<MarketStateSnapshotStore>,
    readers: Vec<Arc<dyn SnapshotReader>>,
}

impl MigrationSnapshotRepository {
    /// Compose the current store with the legacy fallback.
    pub fn new(
        current: Arc<MarketStateSnapshotStore>,
        legacy: Arc<LegacyMarketStateSnapshotStore>,
    ) -> Self {
        Self {
            readers: vec![Arc::clone(&current) as Arc<dyn SnapshotReader>, legacy],
            current,
        }
    }

    /// Compose an arbitrary reader chain. `readers` are tried in order and
    /// must start with the current format; writes go to `current` only.
    pub fn with_readers(
        current: Arc<MarketStateSnapshotStore>,
        readers: Vec<Arc<dyn SnapshotReader>>,
    ) -> Self {
        Self { current, readers }
    }
}

#[async_trait]
impl SnapshotRepository for MigrationSnapshotRepository {
    async fn save(&self, snapshot: &MarketStateSnapshot) -> Result<(), SnapshotError> {
        self.current.save(snapshot).await
    }

    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError> {
        for (position, reader) in self.readers.iter().enumerate() {
            if position > 0 {
                tracing::warn!(
                    fallback_format = reader.format_name(),
                    "Snapshot not found in the preferred format, falling back"
                );
            }

            if let Some(snapshot) = reader.try_get().await? {
                return Ok(Some(snapshot));
            }
        }

        Ok(None)
    }
}
