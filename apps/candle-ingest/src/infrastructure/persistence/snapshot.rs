//! Current-Format Snapshot Store
//!
//! The canonical serialized shape going forward: one JSON object keyed by
//! asset pair, prices as strings to keep decimal precision exact.
//!
//! # Blob Format
//!
//! ```json
//! {
//!   "EURUSD": {
//!     "bid": {"price": "1.1000", "timestamp": "2023-01-01T00:00:00Z"},
//!     "ask": null
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    BlobStore, SnapshotError, SnapshotReader, SnapshotRepository,
};
use crate::domain::market_state::{MarketState, MarketStateSnapshot, PriceState};

#[derive(Debug, Serialize, Deserialize)]
struct StoredPriceState {
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMarketState {
    bid: Option<StoredPriceState>,
    ask: Option<StoredPriceState>,
}

fn to_stored(state: &MarketState) -> StoredMarketState {
    let side = |side: &Option<PriceState>| {
        side.as_ref().map(|s| StoredPriceState {
            price: s.price,
            timestamp: s.timestamp,
        })
    };
    StoredMarketState {
        bid: side(&state.bid),
        ask: side(&state.ask),
    }
}

fn from_stored(stored: StoredMarketState) -> MarketState {
    let side = |side: Option<StoredPriceState>| {
        side.map(|s| PriceState {
            price: s.price,
            timestamp: s.timestamp,
        })
    };
    MarketState {
        bid: side(stored.bid),
        ask: side(stored.ask),
    }
}

/// Snapshot store writing and reading the current format.
pub struct MarketStateSnapshotStore {
    blob: Arc<dyn BlobStore>,
    container: String,
    key: String,
}

impl MarketStateSnapshotStore {
    /// Create a store persisting under `container/key`.
    pub fn new(blob: Arc<dyn BlobStore>, container: String, key: String) -> Self {
        Self {
            blob,
            container,
            key,
        }
    }
}

#[async_trait]
impl SnapshotRepository for MarketStateSnapshotStore {
    async fn save(&self, snapshot: &MarketStateSnapshot) -> Result<(), SnapshotError> {
        let stored: HashMap<&String, StoredMarketState> = snapshot
            .iter()
            .map(|(asset, state)| (asset, to_stored(state)))
            .collect();

        let data = serde_json::to_vec(&stored).map_err(SnapshotError::Encode)?;
        self.blob.put(&self.container, &self.key, data).await?;
        Ok(())
    }

    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError> {
        SnapshotReader::try_get(self).await
    }
}

#[async_trait]
impl SnapshotReader for MarketStateSnapshotStore {
    fn format_name(&self) -> &'static str {
        "current"
    }

    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError> {
        let Some(data) = self.blob.get(&self.container, &self.key).await? else {
            return Ok(None);
        };

        let stored: HashMap<String, StoredMarketState> =
            serde_json::from_slice(&data).map_err(SnapshotError::Decode)?;

        Ok(Some(
            stored
                .into_iter()
                .map(|(asset, state)| (asset, from_stored(state)))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::blob::InMemoryBlobStore;

    fn store() -> MarketStateSnapshotStore {
        MarketStateSnapshotStore::new(
            Arc::new(InMemoryBlobStore::new()),
            "states".to_string(),
            "market-state.json".to_string(),
        )
    }

    fn sample_snapshot() -> MarketStateSnapshot {
        let mut snapshot = MarketStateSnapshot::new();
        snapshot.insert(
            "EURUSD".to_string(),
            MarketState {
                bid: Some(PriceState {
                    price: Decimal::new(11000, 4),
                    timestamp: Utc::now(),
                }),
                ask: None,
            },
        );
        snapshot
    }

    #[tokio::test]
    async fn round_trips_snapshot() {
        let store = store();
        let snapshot = sample_snapshot();

        store.save(&snapshot).await.unwrap();
        let restored = SnapshotRepository::try_get(&store).await.unwrap().unwrap();

        assert_eq!(restored, snapshot);
    }

    #[tokio::test]
    async fn absent_blob_reads_as_none() {
        let store = store();
        assert!(SnapshotRepository::try_get(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prices_are_stored_as_strings() {
        let blob = Arc::new(InMemoryBlobStore::new());
        let store = MarketStateSnapshotStore::new(
            Arc::clone(&blob) as Arc<dyn BlobStore>,
            "states".to_string(),
            "market-state.json".to_string(),
        );

        store.save(&sample_snapshot()).await.unwrap();

        let data = blob.get("states", "market-state.json").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(json["EURUSD"]["bid"]["price"], "1.1000");
        assert!(json["EURUSD"]["ask"].is_null());
    }

    #[tokio::test]
    async fn corrupt_blob_is_an_error_not_a_miss() {
        let blob = Arc::new(InMemoryBlobStore::new());
        blob.put("states", "market-state.json", b"{broken".to_vec())
            .await
            .unwrap();

        let store = MarketStateSnapshotStore::new(
            blob,
            "states".to_string(),
            "market-state.json".to_string(),
        );

        let result = SnapshotRepository::try_get(&store).await;
        assert!(matches!(result, Err(SnapshotError::Decode(_))));
    }
}
