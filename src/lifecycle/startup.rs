//! Startup orchestration.
//!
//! Builds the shared pool, the outbound client, the liveness checker and the
//! dispatcher, then runs the first sweep so the listener only opens once the
//! pool has been vetted.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::health::{LivenessChecker, Probe};
use crate::pool::{EndpointError, PoolManager};
use crate::race::Dispatcher;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid gateway list: {0}")]
    Gateways(#[from] EndpointError),
    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The wired-up core of a running relay.
pub struct Relay {
    pub pool: Arc<PoolManager>,
    pub checker: LivenessChecker,
    pub dispatcher: Dispatcher,
}

/// Build every component from `config`, sharing one pool.
pub fn build(config: &RelayConfig) -> Result<Relay, StartupError> {
    let candidates = config.endpoints()?;
    let client = reqwest::Client::builder().build()?;
    let pool = Arc::new(PoolManager::empty());

    let probe = Probe::new(client.clone(), &config.liveness);
    let checker = LivenessChecker::new(pool.clone(), candidates, probe, &config.liveness);
    let dispatcher = Dispatcher::new(pool.clone(), client, &config.race);

    Ok(Relay { pool, checker, dispatcher })
}

/// Build the relay and run the initial liveness sweep.
pub async fn start(config: &RelayConfig) -> Result<Relay, StartupError> {
    let relay = build(config)?;
    tracing::info!(candidates = relay.checker.candidates().len(), "Running initial liveness sweep");
    relay.checker.sweep().await;
    Ok(relay)
}
