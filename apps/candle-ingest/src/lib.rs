#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Candle Ingest - Quote Ingestion Pipeline
//!
//! Receives price ticks from two heterogeneous upstream feeds, validates and
//! normalizes them into canonical quotes for the candle aggregation engine,
//! and durably persists/restores the aggregator's working state across
//! restarts through a dual-format (current + legacy) snapshot store.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Canonical quote and market-state types
//!   - `quote`: the normalized tick every source converts into
//!   - `market_state`: the per-instrument snapshot mapping
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: interfaces for the broker, blob store, aggregation engine
//!   - `services`: quote dispatch, state tracking, checkpointing
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feeds`: two-way and spot feed adapters with per-feed validation
//!   - `broker`: in-process subscription service for dev/tests
//!   - `persistence`: blob stores, snapshot formats, migration repository
//!   - `config`: environment configuration
//!   - `telemetry`: tracing setup
//!
//! # Data Flow
//!
//! ```text
//! two-way feed ──┐                              ┌──────────────┐
//!                ├──► validate ──► dispatch ───►│  aggregation │
//! spot feed ─────┘                              │    engine    │
//!                                               └──────┬───────┘
//!                        snapshot repository ◄─────────┘
//!                     (current ─fallback─► legacy)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core quote and state types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::market_state::{MarketState, MarketStateSnapshot, PriceState};
pub use domain::quote::Quote;

// Ports
pub use application::ports::{
    BlobError, BlobStore, DeliveryError, DeliveryErrorPolicy, FeedError, ManagedSubscription,
    MessageHandler, ProcessQuoteError, QuoteProcessor, QuoteSource, SnapshotError, SnapshotReader,
    SnapshotRepository, SnapshotSource, SubscriberFactory, SubscriptionError, SubscriptionService,
    SubscriptionSettings,
};

// Services
pub use application::services::checkpoint::SnapshotCheckpointer;
pub use application::services::dispatcher::{DispatchError, DispatchFailurePolicy, QuoteDispatcher};
pub use application::services::tracker::MarketStateTracker;

// Feed adapters
pub use infrastructure::feeds::spot::{SpotFeedSettings, SpotQuoteFeed};
pub use infrastructure::feeds::two_way::{TwoWayFeedSettings, TwoWayQuoteFeed};

// Broker
pub use infrastructure::broker::local::LocalBroker;

// Persistence
pub use infrastructure::persistence::blob::{FsBlobStore, InMemoryBlobStore};
pub use infrastructure::persistence::legacy::LegacyMarketStateSnapshotStore;
pub use infrastructure::persistence::migration::MigrationSnapshotRepository;
pub use infrastructure::persistence::snapshot::MarketStateSnapshotStore;

// Configuration
pub use infrastructure::config::{ConfigError, ConnectionString, IngestConfig, SnapshotSettings};
