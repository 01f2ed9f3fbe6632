//! Port Interfaces
//!
//! Contracts for the external systems this pipeline composes, following
//! the Hexagonal Architecture pattern. Infrastructure adapters implement
//! these; the ingestion services depend only on the traits.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`SubscriptionService`] / [`SubscriberFactory`]: reliable message
//!   delivery from the broker
//! - [`QuoteProcessor`] / [`SnapshotSource`]: the aggregation engine
//! - [`BlobStore`]: opaque key/blob persistence
//! - [`SnapshotRepository`] / [`SnapshotReader`]: aggregator-state snapshots
//!
//! ## Driver Ports (Inbound)
//!
//! - [`QuoteSource`]: lifecycle of one upstream feed adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::domain::market_state::MarketStateSnapshot;
use crate::domain::quote::Quote;

// =============================================================================
// Message Delivery
// =============================================================================

/// Raw payload of one delivered message.
pub type RawPayload = Vec<u8>;

/// Async handler invoked for every delivered message.
///
/// Returning `Err` tells the owning subscription that delivery failed, so
/// its redelivery/dead-letter policy applies. Returning `Ok` acknowledges
/// the message even if it was dropped as invalid.
pub type MessageHandler =
    Arc<dyn Fn(RawPayload) -> BoxFuture<'static, Result<(), DeliveryError>> + Send + Sync>;

/// A message handler failed and the delivery should be retried.
#[derive(Debug, thiserror::Error)]
#[error("message delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Redelivery policy for a subscription: retry after a fixed timeout, then
/// route the message to a dead-letter exchange after bounded attempts.
#[derive(Debug, Clone)]
pub struct DeliveryErrorPolicy {
    /// Fixed delay between redelivery attempts.
    pub retry_delay: Duration,
    /// Attempts before the message is dead-lettered.
    pub max_attempts: u32,
    /// Exchange receiving messages that exhausted their attempts.
    pub dead_letter_exchange: String,
}

/// Declarative description of one durable queue binding.
#[derive(Debug, Clone)]
pub struct SubscriptionSettings {
    /// Broker connection target.
    pub connection: String,
    /// Exchange the queue binds to.
    pub exchange: String,
    /// Queue name.
    pub queue: String,
    /// Routing key for the binding (empty matches everything).
    pub routing_key: String,
    /// Whether the queue survives broker restarts.
    pub durable: bool,
    /// Redelivery policy; `None` leaves the broker's default in place.
    pub error_policy: Option<DeliveryErrorPolicy>,
}

/// Handle to a running subscription.
#[async_trait]
pub trait ManagedSubscription: Send + Sync {
    /// Stop message delivery. Safe to call more than once.
    async fn stop(&mut self);
}

/// Reliable subscription service: delivers messages to a handler and owns
/// acknowledgement, redelivery, and dead-lettering per the configured policy.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Establish a subscription described by `settings`.
    async fn subscribe(
        &self,
        settings: SubscriptionSettings,
        handler: MessageHandler,
    ) -> Result<Box<dyn ManagedSubscription>, SubscriptionError>;
}

/// Shared factory handing out managed subscriptions whose reliability policy
/// (retry, acknowledgement, dead-lettering) is the factory's own concern.
#[async_trait]
pub trait SubscriberFactory: Send + Sync {
    /// Create a subscription on `namespace.source` over `connection`.
    async fn create(
        &self,
        connection: &str,
        namespace: &str,
        source: &str,
        handler: MessageHandler,
    ) -> Result<Box<dyn ManagedSubscription>, SubscriptionError>;
}

/// A subscription could not be established.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// Queue/exchange setup was rejected by the broker.
    #[error("failed to establish subscription on '{exchange}': {reason}")]
    SetupFailed {
        /// Exchange the subscription targeted.
        exchange: String,
        /// Broker-reported reason.
        reason: String,
    },

    /// The broker connection itself failed.
    #[error("broker connection failed: {0}")]
    ConnectionFailed(String),
}

// =============================================================================
// Feed Lifecycle
// =============================================================================

/// Lifecycle of one upstream quote feed.
///
/// Implementations own exactly one subscription; `stop` must be idempotent
/// and safe to call on a feed that never started.
#[async_trait]
pub trait QuoteSource: Send {
    /// Establish the feed's subscription. Failure is fatal for the adapter.
    async fn start(&mut self) -> Result<(), FeedError>;

    /// Tear the subscription down. Never panics, never blocks indefinitely.
    async fn stop(&mut self);
}

/// A feed failed to start.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The underlying subscription could not be established.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

// =============================================================================
// Aggregation Engine
// =============================================================================

/// The downstream candle aggregation engine.
///
/// Must be safe under concurrent invocation: both feed adapters dispatch
/// into it without external synchronization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProcessor: Send + Sync {
    /// Process one validated canonical quote.
    async fn process_quote(&self, quote: Quote) -> Result<(), ProcessQuoteError>;
}

/// The aggregation engine rejected or failed to process a quote.
#[derive(Debug, thiserror::Error)]
#[error("quote processing failed: {0}")]
pub struct ProcessQuoteError(pub String);

/// Exposes the aggregation engine's current working state for checkpointing.
pub trait SnapshotSource: Send + Sync {
    /// Copy of the current per-instrument state mapping.
    fn snapshot(&self) -> MarketStateSnapshot;
}

// =============================================================================
// Persistence
// =============================================================================

/// Opaque key/blob store. No partial writes are visible to readers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob; `None` when the key does not exist.
    async fn get(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Write a blob, replacing any previous content atomically.
    async fn put(&self, container: &str, key: &str, data: Vec<u8>) -> Result<(), BlobError>;
}

/// Blob store I/O failure.
#[derive(Debug, thiserror::Error)]
#[error("blob i/o failed for '{container}/{key}': {source}")]
pub struct BlobError {
    /// Container the operation targeted.
    pub container: String,
    /// Key the operation targeted.
    pub key: String,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// Persistence of the aggregator's working state.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Persist the whole snapshot, replacing the previous one.
    async fn save(&self, snapshot: &MarketStateSnapshot) -> Result<(), SnapshotError>;

    /// Load the snapshot; `None` means no prior state exists (cold start).
    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError>;
}

/// Read side of one snapshot format, used to build the fallback chain.
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    /// Short name of the format, for fallback logging.
    fn format_name(&self) -> &'static str;

    /// Load a snapshot in this format; `None` when absent.
    async fn try_get(&self) -> Result<Option<MarketStateSnapshot>, SnapshotError>;
}

/// Snapshot persistence failure.
///
/// Absence is not an error; a blob that exists but cannot be decoded is,
/// so a corrupt current-format snapshot is never silently shadowed by
/// legacy data.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The underlying blob store failed.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The snapshot could not be serialized.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored blob exists but is not a valid snapshot in its format.
    #[error("snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}
