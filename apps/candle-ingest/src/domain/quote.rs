//! Canonical Quote Model
//!
//! The normalized tick representation every source adapter converts into.
//! A `Quote` that reaches the aggregation engine has already passed the
//! source's validation rule set: the asset pair is non-empty and the
//! timestamp is UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A normalized price tick for one side of an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Traded instrument identifier (e.g., "EURUSD"). Never empty.
    pub asset_pair: String,

    /// Side indicator: `true` for the buy (bid) side, `false` for sell (ask).
    pub is_buy: bool,

    /// Quoted price. Positivity is enforced per source, not here.
    pub price: Decimal,

    /// Quote timestamp, always UTC.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a buy-side quote.
    #[must_use]
    pub const fn buy(asset_pair: String, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            asset_pair,
            is_buy: true,
            price,
            timestamp,
        }
    }

    /// Create a sell-side quote.
    #[must_use]
    pub const fn sell(asset_pair: String, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            asset_pair,
            is_buy: false,
            price,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_constructors() {
        let ts = Utc::now();
        let bid = Quote::buy("EURUSD".to_string(), Decimal::new(11000, 4), ts);
        let ask = Quote::sell("EURUSD".to_string(), Decimal::new(11002, 4), ts);

        assert!(bid.is_buy);
        assert!(!ask.is_buy);
        assert_eq!(bid.asset_pair, ask.asset_pair);
        assert_eq!(bid.timestamp, ask.timestamp);
    }
}
