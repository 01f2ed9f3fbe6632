//! Quote Validation Rule Sets
//!
//! Stateless, per-feed rules evaluated before a quote reaches the
//! aggregation engine. Each function returns the ordered list of
//! human-readable violations; an empty list means the candidate is valid.
//! A missing (JSON `null`) candidate is itself a violation, never a panic.
//!
//! The rule sets intentionally differ: the spot feed rejects non-positive
//! prices while the two-way feed does not, reflecting different trust levels
//! in the upstream sources.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use super::messages::{SpotQuoteMessage, TwoWayQuoteMessage};

fn is_utc(timestamp: &DateTime<FixedOffset>) -> bool {
    timestamp.offset().local_minus_utc() == 0
}

/// Validate a two-way feed candidate.
///
/// Rules: candidate present, non-empty instrument, UTC timestamp.
#[must_use]
pub fn validate_two_way(message: Option<&TwoWayQuoteMessage>) -> Vec<String> {
    let mut violations = Vec::new();

    match message {
        None => violations.push("Quote is null.".to_string()),
        Some(message) => {
            if message.instrument.is_empty() {
                violations.push("Empty 'Instrument'".to_string());
            }
            if !is_utc(&message.date) {
                violations.push(format!(
                    "Invalid 'Date' offset (UTC is required): '{}'",
                    message.date.offset()
                ));
            }
        }
    }

    violations
}

/// Validate a spot feed candidate.
///
/// Rules: candidate present, non-empty asset pair, UTC timestamp,
/// strictly positive price.
#[must_use]
pub fn validate_spot(message: Option<&SpotQuoteMessage>) -> Vec<String> {
    let mut violations = Vec::new();

    match message {
        None => violations.push("Quote is null.".to_string()),
        Some(message) => {
            if message.asset_pair.is_empty() {
                violations.push("Empty 'AssetPair'".to_string());
            }
            if !is_utc(&message.timestamp) {
                violations.push(format!(
                    "Invalid 'Timestamp' offset (UTC is required): '{}'",
                    message.timestamp.offset()
                ));
            }
            if message.price <= Decimal::ZERO {
                violations.push(format!("Not positive price: '{}'", message.price));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use test_case::test_case;

    fn utc_date() -> DateTime<FixedOffset> {
        chrono::Utc
            .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    fn offset_date(secs: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(secs)
            .unwrap()
            .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .unwrap()
    }

    fn two_way(instrument: &str, date: DateTime<FixedOffset>) -> TwoWayQuoteMessage {
        TwoWayQuoteMessage {
            instrument: instrument.to_string(),
            bid: Decimal::new(11000, 4),
            ask: Decimal::new(11002, 4),
            date,
        }
    }

    fn spot(asset_pair: &str, price: Decimal, timestamp: DateTime<FixedOffset>) -> SpotQuoteMessage {
        SpotQuoteMessage {
            asset_pair: asset_pair.to_string(),
            price,
            is_buy: true,
            timestamp,
        }
    }

    #[test]
    fn two_way_valid_message_passes() {
        assert!(validate_two_way(Some(&two_way("EURUSD", utc_date()))).is_empty());
    }

    #[test]
    fn two_way_null_is_single_violation() {
        let violations = validate_two_way(None);
        assert_eq!(violations, vec!["Quote is null.".to_string()]);
    }

    #[test]
    fn two_way_empty_instrument_rejected() {
        let violations = validate_two_way(Some(&two_way("", utc_date())));
        assert_eq!(violations, vec!["Empty 'Instrument'".to_string()]);
    }

    #[test]
    fn two_way_non_utc_rejected() {
        let violations = validate_two_way(Some(&two_way("EURUSD", offset_date(7200))));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("UTC is required"));
        assert!(violations[0].contains("+02:00"));
    }

    #[test]
    fn two_way_collects_all_violations_in_order() {
        let violations = validate_two_way(Some(&two_way("", offset_date(3600))));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0], "Empty 'Instrument'");
        assert!(violations[1].contains("Invalid 'Date'"));
    }

    #[test]
    fn two_way_has_no_price_rule() {
        let mut message = two_way("EURUSD", utc_date());
        message.bid = Decimal::new(-5, 0);
        message.ask = Decimal::ZERO;
        assert!(validate_two_way(Some(&message)).is_empty());
    }

    #[test]
    fn spot_valid_message_passes() {
        assert!(validate_spot(Some(&spot("BTCUSD", Decimal::ONE, utc_date()))).is_empty());
    }

    #[test_case(None, "Quote is null." ; "null candidate")]
    #[test_case(Some(("", 1, 0)), "Empty 'AssetPair'" ; "empty asset pair")]
    #[test_case(Some(("BTCUSD", 1, 7200)), "UTC is required" ; "non utc timestamp")]
    #[test_case(Some(("BTCUSD", -5, 0)), "Not positive price: '-5'" ; "negative price")]
    #[test_case(Some(("BTCUSD", 0, 0)), "Not positive price: '0'" ; "zero price")]
    fn spot_single_rule_failures(candidate: Option<(&str, i64, i32)>, expected: &str) {
        let message =
            candidate.map(|(pair, price, offset)| spot(pair, Decimal::new(price, 0), offset_date(offset)));

        let violations = validate_spot(message.as_ref());
        assert_eq!(violations.len(), 1);
        assert!(
            violations[0].contains(expected),
            "expected '{}' in '{}'",
            expected,
            violations[0]
        );
    }

    proptest! {
        #[test]
        fn spot_price_rule_matches_sign(mantissa in -1_000_000_000i64..1_000_000_000i64) {
            let price = Decimal::new(mantissa, 4);
            let violations = validate_spot(Some(&spot("BTCUSD", price, utc_date())));
            let has_price_violation = violations.iter().any(|v| v.contains("Not positive price"));
            prop_assert_eq!(has_price_violation, price <= Decimal::ZERO);
        }
    }
}
