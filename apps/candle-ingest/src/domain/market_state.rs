//! Aggregator Market-State Snapshot Model
//!
//! The working state the aggregation engine needs to warm-restart mid-price
//! generation: the last-seen price per side, per instrument. The whole
//! mapping is persisted as one blob and read back exactly once at process
//! start.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::quote::Quote;

/// The aggregator's working state: one `MarketState` per asset pair.
pub type MarketStateSnapshot = HashMap<String, MarketState>;

/// Last-seen price and time for one side of an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceState {
    /// Last quoted price on this side.
    pub price: Decimal,
    /// When that price was quoted (UTC).
    pub timestamp: DateTime<Utc>,
}

/// Per-instrument market state tracked by the aggregation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketState {
    /// Last buy-side (bid) price, if any was seen.
    pub bid: Option<PriceState>,
    /// Last sell-side (ask) price, if any was seen.
    pub ask: Option<PriceState>,
}

impl MarketState {
    /// Fold a quote into this state, replacing the matching side.
    pub fn apply(&mut self, quote: &Quote) {
        let state = PriceState {
            price: quote.price,
            timestamp: quote.timestamp,
        };
        if quote.is_buy {
            self.bid = Some(state);
        } else {
            self.ask = Some(state);
        }
    }

    /// Mid price, available once both sides have been seen.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        match (&self.bid, &self.ask) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::TWO),
            _ => None,
        }
    }
}
