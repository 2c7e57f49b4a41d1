//! Request validation and race orchestration.
//!
//! # Responsibilities
//! - Turn a request path into a content identifier (or a redirect/diagnostic)
//! - Race the current pool snapshot and hand back the winner
//! - Drain losers in the background without delaying the winner
//!
//! # Design Decisions
//! - Drains run on a `TaskTracker` so shutdown (and tests) can wait for them
//! - If the caller drops the race future, the attempt is dropped with it and
//!   every fetch is aborted

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio_util::task::TaskTracker;

use crate::config::RaceConfig;
use crate::http::response::forwarded_request_headers;
use crate::pool::PoolManager;
use crate::race::attempt::{RaceAttempt, Winner};
use crate::race::error::RelayError;

/// Path prefix the relay serves.
pub const IPFS_PREFIX: &str = "/ipfs/";

/// Races every request across the live pool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<PoolManager>,
    client: reqwest::Client,
    timeout: Duration,
    min_identifier_len: usize,
    drains: TaskTracker,
}

impl Dispatcher {
    pub fn new(pool: Arc<PoolManager>, client: reqwest::Client, config: &RaceConfig) -> Self {
        Self {
            pool,
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            min_identifier_len: config.min_identifier_len,
            drains: TaskTracker::new(),
        }
    }

    /// Override the per-mirror fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the identifier (`<cid>/<sub-path>`) from a request path.
    ///
    /// A bare `<cid>` is redirected to `<path>/` before the length rule is
    /// applied, so `/ipfs/abc` redirects and `/ipfs/abc/` is rejected.
    /// Identifiers with `.` or `..` segments are always rejected.
    pub fn identifier<'a>(&self, path: &'a str) -> Result<&'a str, RelayError> {
        let identifier = path.strip_prefix(IPFS_PREFIX).unwrap_or_else(|| path.trim_start_matches('/'));

        if identifier.is_empty() || has_dot_segment(identifier) {
            return Err(RelayError::InvalidIdentifier(identifier.to_string()));
        }
        if !identifier.contains('/') {
            return Err(RelayError::Redirect {
                location: format!("{path}/"),
            });
        }
        if identifier.len() < self.min_identifier_len {
            return Err(RelayError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(identifier)
    }

    /// Race `identifier` across the current pool.
    ///
    /// Returns as soon as one mirror answers `200 OK`; the remaining fetches
    /// are cancelled and drained on a tracked task.
    pub async fn race(&self, identifier: &str, inbound: &HeaderMap) -> Result<Winner, RelayError> {
        let endpoints = self.pool.snapshot();
        if endpoints.is_empty() {
            return Err(RelayError::EmptyPool);
        }

        let headers = forwarded_request_headers(inbound);
        let mut attempt = RaceAttempt::launch(&self.client, &endpoints, identifier, &headers, self.timeout);

        match attempt.next_winner().await {
            Some(winner) => {
                tracing::debug!(identifier = %identifier, url = %winner.response.url(), "Race won");
                self.drains.spawn(attempt.drain());
                Ok(winner)
            }
            None => {
                // Every fetch already resolved; this only collects the tally.
                let summary = attempt.drain().await;
                Err(RelayError::NoWinner {
                    identifier: identifier.to_string(),
                    attempted: summary.launched,
                })
            }
        }
    }

    /// Race drains still running.
    pub fn pending_drains(&self) -> usize {
        self.drains.len()
    }

    /// Wait for every outstanding drain. New races may still start afterwards.
    pub async fn drained(&self) {
        self.drains.close();
        self.drains.wait().await;
        self.drains.reopen();
    }
}

/// Whether any segment is `.` or `..`, raw or percent-encoded.
///
/// URL parsing collapses such segments, which would move the upstream request
/// outside the mirror's template path. Backslashes count as separators
/// because they do for http(s) URLs.
fn has_dot_segment(identifier: &str) -> bool {
    identifier.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
