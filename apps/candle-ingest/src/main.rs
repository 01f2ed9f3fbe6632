//! Candle Ingest Binary
//!
//! Starts the quote ingestion pipeline: restores the aggregator state
//! snapshot, begins checkpointing, and runs both feed adapters until a
//! shutdown signal arrives.
//!
//! The binary wires the in-process broker behind the subscription ports;
//! production deployments embed the library with a real broker adapter.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin candle-ingest
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `CANDLE_INGEST_TWO_WAY_CONNECTION`: two-way feed broker connection
//! - `CANDLE_INGEST_SPOT_CONNECTION`: spot feed broker connection
//!
//! ## Optional
//! - See `infrastructure::config::settings` for the full list
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;

use candle_ingest::infrastructure::telemetry;
use candle_ingest::{
    DeliveryErrorPolicy, FsBlobStore, IngestConfig, LegacyMarketStateSnapshotStore, LocalBroker,
    MarketStateSnapshotStore, MarketStateTracker, MigrationSnapshotRepository, QuoteSource,
    SnapshotCheckpointer, SnapshotRepository, SpotQuoteFeed, TwoWayQuoteFeed,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    tracing::info!("Starting candle ingest");

    let config = IngestConfig::from_env()?;
    log_config(&config);

    let shutdown = CancellationToken::new();

    // Snapshot persistence with legacy fallback
    let blob = Arc::new(FsBlobStore::new(config.snapshot.blob_root.clone()));
    let current = Arc::new(MarketStateSnapshotStore::new(
        blob.clone(),
        config.snapshot.container.clone(),
        config.snapshot.key.clone(),
    ));
    let legacy = Arc::new(LegacyMarketStateSnapshotStore::new(
        blob,
        config.snapshot.container.clone(),
        config.snapshot.legacy_key.clone(),
    ));
    let repository = Arc::new(MigrationSnapshotRepository::new(current, legacy));

    // Restore the aggregator state, or start cold
    let tracker = match repository.try_get().await? {
        Some(snapshot) => {
            tracing::info!(assets = snapshot.len(), "Restored aggregator state");
            Arc::new(MarketStateTracker::from_snapshot(snapshot))
        }
        None => {
            tracing::info!("No prior aggregator state, starting cold");
            Arc::new(MarketStateTracker::new())
        }
    };

    // Periodic + shutdown checkpointing
    let checkpointer = SnapshotCheckpointer::new(
        tracker.clone(),
        repository.clone(),
        config.snapshot.checkpoint_interval,
        shutdown.clone(),
    );
    let checkpoint_task = tokio::spawn(checkpointer.run());

    // Feeds over the in-process broker
    let broker = Arc::new(LocalBroker::new(DeliveryErrorPolicy {
        retry_delay: config.two_way.retry_delay,
        max_attempts: config.two_way.max_delivery_attempts,
        dead_letter_exchange: config.two_way.dead_letter_exchange.clone(),
    }));

    let mut feeds: Vec<Box<dyn QuoteSource>> = vec![
        Box::new(TwoWayQuoteFeed::new(
            config.two_way.clone(),
            broker.clone(),
            tracker.clone(),
        )),
        Box::new(SpotQuoteFeed::new(
            config.spot.clone(),
            broker.clone(),
            tracker.clone(),
        )),
    ];

    for feed in &mut feeds {
        feed.start().await?;
    }

    tracing::info!("Candle ingest ready");

    await_shutdown().await;

    for feed in &mut feeds {
        feed.stop().await;
    }

    shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, checkpoint_task).await {
        Ok(result) => result??,
        Err(_) => tracing::error!("Timed out waiting for the final snapshot save"),
    }

    tracing::info!("Candle ingest stopped");
    Ok(())
}

/// Graceful shutdown timeout for the final snapshot save.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Load .env file from the current or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &IngestConfig) {
    tracing::info!(
        two_way_exchange = %config.two_way.exchange,
        dead_letter_exchange = %config.two_way.dead_letter_exchange,
        spot_namespace = %config.spot.namespace,
        spot_source = %config.spot.source,
        blob_root = %config.snapshot.blob_root.display(),
        checkpoint_interval_secs = config.snapshot.checkpoint_interval.as_secs(),
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
