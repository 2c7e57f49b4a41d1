//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): inbound requests by outcome
//! - `relay_request_duration_seconds` (histogram): time to first byte of the answer
//! - `relay_race_losers_total` (counter): losing fetches by reason
//! - `relay_probe_total` (counter): liveness probes by result
//! - `relay_pool_size` (gauge): mirrors in the live pool
//! - `relay_sweep_duration_seconds` (histogram): liveness sweep wall time

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one inbound request and how long it took to answer.
pub fn record_request(outcome: &'static str, start: Instant) {
    metrics::counter!("relay_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a fetch that did not win its race.
pub fn record_loser(reason: &'static str) {
    metrics::counter!("relay_race_losers_total", "reason" => reason).increment(1);
}

pub fn record_probe(passed: bool) {
    let result = if passed { "pass" } else { "fail" };
    metrics::counter!("relay_probe_total", "result" => result).increment(1);
}

pub fn record_sweep(start: Instant) {
    metrics::histogram!("relay_sweep_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn set_pool_size(size: usize) {
    metrics::gauge!("relay_pool_size").set(size as f64);
}
