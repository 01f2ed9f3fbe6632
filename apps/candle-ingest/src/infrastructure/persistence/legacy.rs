//! Legacy-Format Snapshot Store
//!
//! Read-only store for state written before the format migration: a JSON
//! array of flat per-asset records with numeric prices. Semantically
//! equivalent to the current format, never written anymore.
//!
//! # Blob Format
//!
//! ```json
//! [
//!   {"Asset": "EURUSD", "Bid": 1.1, "BidAt": "2023-01-01T00:00:00Z",
//!    "Ask": 1.1002, "AskAt": "2023-01-01T00:00:00Z"}
//! ]
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{BlobStore, SnapshotError, SnapshotReader};
use crate::domain::market_state::{MarketState, MarketStateSnapshot, PriceState};

#[derive(Debug, Deserialize)]
struct LegacyMarketStateEntry {
    #[serde(rename = "Asset")]
    asset: String,
    #[serde(rename = "Bid")]
    bid: Option<Decimal>,
    #[serde(rename = "BidAt")]
    bid_at: Option<DateTime<Utc>>,
    #[serde(rename = "Ask")]
    ask: Option<Decimal>,
    #[serde(rename = "AskAt")]
    ask_at: Option<DateTime<Utc>>,
}

fn side(price: Option<Decimal>, at: Option<DateTime<Utc>>) -> Option<PriceState> {
    match (price, at) {
        (Some(price), Some(timestamp)) => Some(PriceState { price, timestamp }),
        _ => None,
    }
}

impl From<LegacyMarketStateEntry> for MarketState {
    fn from(entry: LegacyMarketStateEntry) -> Self {
        Self {
            bid: side(entry.bid, entry.bid_at),
            ask: side(entry.ask, entry.ask_at),
        }
    }
}

/// Read-only snapshot store for the pre-migration format.
pub struct LegacyMarketStateSnapshotStore {
    blob: Arc<dyn BlobStore>,
    container: String,
    key: String,
}

impl LegacyMarketStateSnapshotStore {
    /// Create a store reading from `container/key`.
    pub fn new(blob: Arc<dyn BlobStore>, container: String, key: String) -> Self {
        Self {
            blob,
            container,
            key,
        }
    }
}

#[async_trait]
impl SnapshotReader for LegacyMarketStateSnapshotStore {
    fn format_name(&self) -> &'static str {
        "legacy"
    }

    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError> {
        let Some(data) = self.blob.get(&self.container, &self.key).await? else {
            return Ok(None);
        };

        let entries: Vec<LegacyMarketStateEntry> =
            serde_json::from_slice(&data).map_err(SnapshotError::Decode)?;

        Ok(Some(
            entries
                .into_iter()
                .map(|entry| {
                    let asset = entry.asset.clone();
                    (asset, MarketState::from(entry))
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::blob::InMemoryBlobStore;

    async fn store_with(blob_json: &str) -> LegacyMarketStateSnapshotStore {
        let blob = Arc::new(InMemoryBlobStore::new());
        blob.put("states", "legacy.json", blob_json.as_bytes().to_vec())
            .await
            .unwrap();
        LegacyMarketStateSnapshotStore::new(blob, "states".to_string(), "legacy.json".to_string())
    }

    #[tokio::test]
    async fn decodes_legacy_entries() {
        let store = store_with(
            r#"[{"Asset":"EURUSD","Bid":1.1,"BidAt":"2023-01-01T00:00:00Z","Ask":1.1002,"AskAt":"2023-01-01T00:00:00Z"}]"#,
        )
        .await;

        let snapshot = store.try_get().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);

        let state = &snapshot["EURUSD"];
        assert_eq!(state.bid.as_ref().map(|s| s.price), Some(Decimal::new(11, 1)));
        assert_eq!(
            state.ask.as_ref().map(|s| s.price),
            Some(Decimal::new(11002, 4))
        );
    }

    #[tokio::test]
    async fn half_recorded_side_reads_as_absent() {
        let store = store_with(r#"[{"Asset":"EURUSD","Bid":1.1,"BidAt":null,"Ask":null,"AskAt":null}]"#).await;

        let snapshot = store.try_get().await.unwrap().unwrap();
        let state = &snapshot["EURUSD"];
        assert!(state.bid.is_none());
        assert!(state.ask.is_none());
    }

    #[tokio::test]
    async fn absent_blob_reads_as_none() {
        let blob = Arc::new(InMemoryBlobStore::new());
        let store = LegacyMarketStateSnapshotStore::new(
            blob,
            "states".to_string(),
            "legacy.json".to_string(),
        );
        assert!(store.try_get().await.unwrap().is_none());
    }
}
