//! Upstream Feed Adapters
//!
//! Two heterogeneous quote feeds converge on the canonical quote model:
//!
//! - [`two_way::TwoWayQuoteFeed`]: one inbound message carries a bid and an
//!   ask; the adapter owns its subscription settings including dead-letter
//!   routing, and swallows per-quote dispatch failures.
//! - [`spot::SpotQuoteFeed`]: one inbound message carries one resolved tick;
//!   the subscription comes from a shared factory that owns the reliability
//!   policy, and dispatch failures are re-raised to it.
//!
//! Wire timestamps keep their offset through deserialization so a non-UTC
//! timestamp can be rejected instead of silently converted.

/// Source-native wire message types.
pub mod messages;

/// Spot feed adapter.
pub mod spot;

/// Two-way feed adapter.
pub mod two_way;

/// Per-feed validation rule sets.
pub mod validation;
