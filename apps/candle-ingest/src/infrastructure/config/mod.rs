//! Configuration
//!
//! Typed settings loaded from environment variables at startup. No ambient
//! globals: values are parsed once and injected into components at
//! construction.

mod settings;

pub use settings::{ConfigError, ConnectionString, IngestConfig, SnapshotSettings};
