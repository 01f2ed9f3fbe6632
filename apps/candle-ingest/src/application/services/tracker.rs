//! Market-State Tracker
//!
//! In-process holder of the aggregation engine's per-instrument working
//! state. It implements the [`QuoteProcessor`] port so the pipeline can run
//! end-to-end; a full candle engine replaces it behind the same port.
//!
//! Both feed adapters dispatch into the tracker concurrently, so the state
//! mapping sits behind an `RwLock`.

use parking_lot::RwLock;

use crate::application::ports::{ProcessQuoteError, QuoteProcessor, SnapshotSource};
use crate::domain::market_state::MarketStateSnapshot;
use crate::domain::quote::Quote;

use async_trait::async_trait;

/// Tracks the last-seen bid/ask per asset pair.
#[derive(Debug, Default)]
pub struct MarketStateTracker {
    state: RwLock<MarketStateSnapshot>,
}

impl MarketStateTracker {
    /// Create a tracker with no prior state (cold start).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker seeded from a restored snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: MarketStateSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Number of instruments with tracked state.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.state.read().len()
    }
}

#[async_trait]
impl QuoteProcessor for MarketStateTracker {
    async fn process_quote(&self, quote: Quote) -> Result<(), ProcessQuoteError> {
        let mut state = self.state.write();
        state
            .entry(quote.asset_pair.clone())
            .or_default()
            .apply(&quote);
        Ok(())
    }
}

impl SnapshotSource for MarketStateTracker {
    fn snapshot(&self) -> MarketStateSnapshot {
        self.state.read().clone()
    }
}
