//! IPFS relay (v1)
//!
//! Races content requests across public IPFS mirrors.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                    IPFS RELAY                     │
//!   GET /ipfs/<cid>/… │  ┌────────┐    ┌────────────┐    ┌────────────┐  │
//!  ───────────────────┼─▶│  http  │───▶│    race    │───▶│ mirror A   │──┼──▶
//!                     │  │ server │    │ dispatcher │───▶│ mirror B   │──┼──▶
//!  ◀──────────────────┼──│        │◀───│ first 200  │───▶│ mirror C   │──┼──▶
//!     winner's body   │  └────────┘    └─────┬──────┘    └────────────┘  │
//!                     │                      │ snapshot                   │
//!                     │                ┌─────▼──────┐   ┌─────────────┐  │
//!                     │                │    pool    │◀──│  liveness   │  │
//!                     │                │  manager   │   │   checker   │  │
//!                     │                └────────────┘   └─────────────┘  │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ipfs_relay::config::{load_config, watcher::ConfigWatcher, RelayConfig};
use ipfs_relay::lifecycle::{signals, startup, Shutdown};
use ipfs_relay::observability::{logging, metrics};
use ipfs_relay::RelayServer;

#[derive(Parser)]
#[command(name = "ipfs-relay")]
#[command(about = "Race IPFS content requests across public gateways", long_about = None)]
struct Cli {
    /// TOML configuration file (hot-reloads the gateway list).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to host on; overrides the configured bind address.
    #[arg(short, long)]
    port: Option<u16>,

    /// Debug logging.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    let level = if cli.debug { "debug" } else { config.observability.log_level.as_str() };
    logging::init_logging(level);

    tracing::info!("ipfs-relay v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        gateways = config.gateways.len(),
        sweep_interval_secs = config.liveness.interval_secs,
        race_timeout_secs = config.race.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let checker_shutdown = shutdown.subscribe();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    // Initial sweep runs before the listener is bound.
    let relay = startup::start(&config).await?;

    let (_watcher, updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };
    let checker = tokio::spawn(relay.checker.run(updates, checker_shutdown));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Running");

    RelayServer::new(relay.dispatcher)
        .run(listener, server_shutdown)
        .await?;

    shutdown.trigger();
    if let Err(e) = checker.await {
        tracing::error!(error = %e, "Liveness checker task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
