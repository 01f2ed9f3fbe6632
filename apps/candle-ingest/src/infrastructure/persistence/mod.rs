//! Snapshot Persistence
//!
//! The aggregator's working state is persisted as one blob through the
//! [`crate::application::ports::BlobStore`] port. Two serialized formats
//! exist: the current format (the only one ever written) and a read-only
//! legacy format kept for state written before the migration. The
//! [`migration::MigrationSnapshotRepository`] composes them as an ordered
//! fallback chain.

/// Filesystem and in-memory blob stores.
pub mod blob;

/// Legacy-format snapshot store (read-only).
pub mod legacy;

/// Migration-aware repository composing the formats.
pub mod migration;

/// Current-format snapshot store.
pub mod snapshot;
