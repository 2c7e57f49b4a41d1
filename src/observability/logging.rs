//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the relay and tower-http log at the
//! requested level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a level.
pub fn default_directive(level: &str) -> String {
    format!("ipfs_relay={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
