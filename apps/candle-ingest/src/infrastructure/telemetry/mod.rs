//! Tracing Initialization
//!
//! Structured logging through `tracing` with an env-filtered fmt subscriber.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level directives (default: `candle_ingest=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before any component logs.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env().add_directive(
        "candle_ingest=info"
            .parse()
            .expect("static directive 'candle_ingest=info' is valid"),
    );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
