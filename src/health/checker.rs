//! Liveness sweeps over the configured mirrors.
//!
//! # Responsibilities
//! - Probe every candidate mirror with bounded concurrency
//! - Install the survivors as the new pool in one swap
//! - Repeat after a fixed pause, or right away when the candidate list changes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::{self, JoinError, JoinSet};
use tokio::time;

use crate::config::{LivenessConfig, RelayConfig};
use crate::health::probe::{Probe, ProbeError, ProbeResult};
use crate::observability::metrics;
use crate::pool::{Endpoint, PoolManager};

/// Periodic prober that owns the candidate list and writes the pool.
pub struct LivenessChecker {
    pool: Arc<PoolManager>,
    candidates: Vec<Endpoint>,
    probe: Arc<Probe>,
    concurrency: usize,
    interval: Duration,
}

impl LivenessChecker {
    pub fn new(
        pool: Arc<PoolManager>,
        candidates: Vec<Endpoint>,
        probe: Probe,
        config: &LivenessConfig,
    ) -> Self {
        Self {
            pool,
            candidates,
            probe: Arc::new(probe),
            concurrency: config.concurrency.max(1),
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Override the pause between sweeps.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    /// Probe every candidate, then replace the pool with the ones that passed.
    ///
    /// Always re-probes the full candidate list, so a mirror that failed one
    /// sweep gets another chance in the next.
    pub async fn sweep(&self) -> Arc<Vec<Endpoint>> {
        let start = Instant::now();
        tracing::debug!(candidates = self.candidates.len(), concurrency = self.concurrency, "Liveness sweep starting");

        let mut passed = vec![false; self.candidates.len()];
        for (index, result) in self.probe_all().await {
            metrics::record_probe(result.passed());
            passed[index] = result.passed();
            match result.outcome {
                Ok(()) => tracing::info!(endpoint = %result.endpoint, "Mirror passed liveness probe"),
                Err(e) => tracing::info!(endpoint = %result.endpoint, error = %e, "Mirror failed liveness probe"),
            }
        }

        // Keep configured order so the pool is stable across sweeps.
        let live: Vec<Endpoint> = self
            .candidates
            .iter()
            .zip(passed)
            .filter_map(|(endpoint, ok)| ok.then(|| endpoint.clone()))
            .collect();

        if live.is_empty() {
            tracing::warn!(candidates = self.candidates.len(), "Found 0 functional gateways, pool is now empty");
        } else {
            tracing::info!(live = live.len(), candidates = self.candidates.len(), "Found functional gateways");
        }

        self.pool.replace(live);
        metrics::record_sweep(start);
        tracing::debug!(elapsed = ?start.elapsed(), "Liveness sweep finished");
        self.pool.snapshot()
    }

    /// Run one probe per candidate, at most `concurrency` at a time, and wait
    /// for every result.
    async fn probe_all(&self) -> Vec<(usize, ProbeResult)> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut probes = JoinSet::new();
        let mut spawned = HashMap::new();

        for (index, endpoint) in self.candidates.iter().enumerate() {
            let permits = permits.clone();
            let probe = self.probe.clone();
            let endpoint = endpoint.clone();
            let handle = probes.spawn(async move {
                // The semaphore is never closed, so this only waits for a slot.
                let _permit = permits.acquire_owned().await.ok();
                probe.check(&endpoint).await
            });
            spawned.insert(handle.id(), index);
        }

        let mut results = Vec::with_capacity(spawned.len());
        while let Some(joined) = probes.join_next_with_id().await {
            let (id, outcome) = probe_outcome(joined);
            if let Some(index) = spawned.remove(&id) {
                let endpoint = self.candidates[index].clone();
                results.push((index, ProbeResult { endpoint, outcome }));
            }
        }
        results
    }

    /// Sweep loop. The first sweep is expected to have been run by the caller
    /// before serving; this waits `interval` after each completed sweep.
    pub async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            candidates = self.candidates.len(),
            "Liveness checker starting"
        );

        loop {
            tokio::select! {
                _ = time::sleep(self.interval) => {
                    self.sweep().await;
                }
                Some(config) = updates.recv() => {
                    match config.endpoints() {
                        Ok(candidates) => {
                            tracing::info!(candidates = candidates.len(), "Gateway list reloaded");
                            self.candidates = candidates;
                            self.sweep().await;
                        }
                        Err(e) => tracing::error!(error = %e, "Ignoring reloaded gateway list"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Liveness checker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// A probe task that panicked or was aborted counts as a failed probe.
fn probe_outcome(
    joined: Result<(task::Id, Result<(), ProbeError>), JoinError>,
) -> (task::Id, Result<(), ProbeError>) {
    match joined {
        Ok((id, outcome)) => (id, outcome),
        Err(e) => (e.id(), Err(ProbeError::Task(e.to_string()))),
    }
}
