//! Feed Wire Message Types
//!
//! Source-native JSON shapes as delivered by the broker. Timestamps are
//! deserialized as [`DateTime<FixedOffset>`] so the original offset survives
//! into validation; conversion to UTC happens only after a quote passes.
//!
//! # Wire Formats
//!
//! Two-way feed:
//! ```json
//! {"instrument": "EURUSD", "bid": 1.1000, "ask": 1.1002, "date": "2023-01-01T00:00:00Z"}
//! ```
//!
//! Spot feed:
//! ```json
//! {"assetPair": "BTCUSD", "price": 64250.5, "isBuy": true, "timestamp": "2023-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One two-way (bid/ask) price message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoWayQuoteMessage {
    /// Traded instrument identifier.
    pub instrument: String,

    /// Buy-side price.
    pub bid: Decimal,

    /// Sell-side price.
    pub ask: Decimal,

    /// Quote timestamp with its original offset.
    pub date: DateTime<FixedOffset>,
}

/// One single-sided spot tick message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotQuoteMessage {
    /// Traded asset pair identifier.
    #[serde(rename = "assetPair")]
    pub asset_pair: String,

    /// Tick price.
    pub price: Decimal,

    /// Side, already resolved upstream.
    #[serde(rename = "isBuy")]
    pub is_buy: bool,

    /// Quote timestamp with its original offset.
    pub timestamp: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_two_way_utc() {
        let json = r#"{"instrument":"EURUSD","bid":1.1000,"ask":1.1002,"date":"2023-01-01T00:00:00Z"}"#;
        let msg: TwoWayQuoteMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.instrument, "EURUSD");
        assert_eq!(msg.bid, Decimal::new(11000, 4));
        assert_eq!(msg.ask, Decimal::new(11002, 4));
        assert_eq!(msg.date.offset().local_minus_utc(), 0);
    }

    #[test]
    fn deserialize_two_way_preserves_offset() {
        let json = r#"{"instrument":"EURUSD","bid":1.1,"ask":1.2,"date":"2023-01-01T02:00:00+02:00"}"#;
        let msg: TwoWayQuoteMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.date.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn deserialize_spot() {
        let json =
            r#"{"assetPair":"BTCUSD","price":64250.5,"isBuy":true,"timestamp":"2023-01-01T00:00:00Z"}"#;
        let msg: SpotQuoteMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.asset_pair, "BTCUSD");
        assert_eq!(msg.price, Decimal::new(642505, 1));
        assert!(msg.is_buy);
    }

    #[test]
    fn null_payload_is_none() {
        let msg: Option<TwoWayQuoteMessage> = serde_json::from_str("null").unwrap();
        assert!(msg.is_none());

        let msg: Option<SpotQuoteMessage> = serde_json::from_str("null").unwrap();
        assert!(msg.is_none());
    }

    #[test]
    fn malformed_payload_is_error() {
        assert!(serde_json::from_str::<Option<SpotQuoteMessage>>("{not json").is_err());
        assert!(serde_json::from_str::<Option<TwoWayQuoteMessage>>(r#"{"instrument":1}"#).is_err());
    }

    #[test]
    fn missing_offset_is_error() {
        // RFC 3339 requires an explicit offset; a bare local time is malformed.
        let json = r#"{"assetPair":"BTCUSD","price":1,"isBuy":false,"timestamp":"2023-01-01T00:00:00"}"#;
        assert!(serde_json::from_str::<SpotQuoteMessage>(json).is_err());
    }
}
