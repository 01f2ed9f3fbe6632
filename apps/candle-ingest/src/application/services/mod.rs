//! Ingestion Services
//!
//! The pieces between the feed adapters and the external collaborators:
//! dispatching validated quotes into the aggregation engine, holding the
//! engine's working state, and checkpointing that state.

/// Quote dispatch with per-source failure policy.
pub mod dispatcher;

/// In-process holder of the aggregator's market state.
pub mod tracker;

/// Periodic and shutdown snapshot persistence.
pub mod checkpoint;
