//! Application layer - Port definitions and ingestion services.

/// Interfaces for the broker, blob store, and aggregation engine.
pub mod ports;

/// Dispatcher, market-state tracker, and snapshot checkpointer.
pub mod services;
