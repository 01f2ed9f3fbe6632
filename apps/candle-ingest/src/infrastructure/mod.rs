//! Infrastructure layer - Adapters and external integrations.

/// In-process broker implementation of the subscription ports.
pub mod broker;

/// Configuration loaded from environment variables.
pub mod config;

/// Upstream feed adapters, wire types, and validation.
pub mod feeds;

/// Blob stores and snapshot repositories.
pub mod persistence;

/// Logging/tracing initialization.
pub mod telemetry;
