//! One race: a fetch per mirror, first `200 OK` wins, the rest are cancelled.
//!
//! Each fetch task waits on whichever comes first of its cancellation token
//! and the transport call. Losing the select drops the in-flight request
//! future, which aborts that request's connection and nothing else. Every
//! task yields exactly one [`FetchOutcome`], so the attempt can account for
//! all of them before it is dropped.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::pool::{Endpoint, EndpointError};

/// Why a single fetch did not deliver.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// What a single fetch task reports back.
#[derive(Debug)]
pub enum FetchOutcome {
    /// `200 OK`; headers are in, the body has not been read.
    Delivered(reqwest::Response),
    /// The mirror answered with some other status.
    Rejected(StatusCode),
    Failed(FetchError),
    /// Cancelled before the mirror answered.
    Cancelled,
}

impl FetchOutcome {
    fn loser_reason(&self) -> &'static str {
        match self {
            FetchOutcome::Delivered(_) => "late",
            FetchOutcome::Rejected(_) => "status",
            FetchOutcome::Failed(_) => "error",
            FetchOutcome::Cancelled => "cancelled",
        }
    }
}

/// The mirror response chosen for a request.
#[derive(Debug)]
pub struct Winner {
    pub endpoint: Endpoint,
    pub response: reqwest::Response,
}

/// Tally of how the non-winning fetches of an attempt resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RaceSummary {
    pub launched: usize,
    pub won: usize,
    /// Succeeded, but after the winner was chosen.
    pub late: usize,
    pub rejected: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RaceSummary {
    /// Fetches whose outcome has been observed.
    pub fn resolved(&self) -> usize {
        self.won + self.late + self.rejected + self.failed + self.cancelled
    }

    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Delivered(_) => self.late += 1,
            FetchOutcome::Rejected(_) => self.rejected += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
            FetchOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

/// Per-request race state. Dropping it aborts any fetch still running.
pub struct RaceAttempt {
    identifier: String,
    fetches: JoinSet<(Endpoint, FetchOutcome)>,
    cancel: CancellationToken,
    summary: RaceSummary,
}

impl RaceAttempt {
    /// Spawn one fetch per endpoint.
    pub fn launch(
        client: &reqwest::Client,
        endpoints: &[Endpoint],
        identifier: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let mut fetches = JoinSet::new();

        for endpoint in endpoints {
            let fetch = fetch(
                client.clone(),
                endpoint.clone(),
                identifier.to_string(),
                headers.clone(),
                timeout,
                cancel.child_token(),
            );
            fetches.spawn(fetch);
        }

        Self {
            identifier: identifier.to_string(),
            fetches,
            cancel,
            summary: RaceSummary {
                launched: endpoints.len(),
                ..RaceSummary::default()
            },
        }
    }

    /// Wait for the first fetch to deliver, in completion order.
    ///
    /// Returns `None` once every fetch has resolved without a winner. Call
    /// at most once with a winner; later deliveries are counted as late.
    pub async fn next_winner(&mut self) -> Option<Winner> {
        while let Some(joined) = self.fetches.join_next().await {
            let (endpoint, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(identifier = %self.identifier, error = %e, "Fetch task failed");
                    self.summary.failed += 1;
                    metrics::record_loser("error");
                    continue;
                }
            };

            if self.summary.won == 0 {
                if let FetchOutcome::Delivered(response) = outcome {
                    self.summary.won = 1;
                    return Some(Winner { endpoint, response });
                }
            }

            match &outcome {
                FetchOutcome::Rejected(status) => {
                    tracing::debug!(endpoint = %endpoint, status = %status, "Mirror lost race: bad status")
                }
                FetchOutcome::Failed(e) => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "Mirror lost race: error")
                }
                _ => {}
            }
            metrics::record_loser(outcome.loser_reason());
            self.summary.record(&outcome);
        }
        None
    }

    /// Cancel every fetch still in flight and wait until all have reported.
    ///
    /// Late responses are dropped here, which releases their bodies.
    pub async fn drain(mut self) -> RaceSummary {
        self.cancel.cancel();
        while let Some(joined) = self.fetches.join_next().await {
            match joined {
                Ok((_, outcome)) => {
                    metrics::record_loser(outcome.loser_reason());
                    self.summary.record(&outcome);
                }
                Err(e) => {
                    tracing::error!(identifier = %self.identifier, error = %e, "Fetch task failed");
                    metrics::record_loser("error");
                    self.summary.failed += 1;
                }
            }
        }

        debug_assert_eq!(self.summary.resolved(), self.summary.launched);
        tracing::debug!(
            identifier = %self.identifier,
            launched = self.summary.launched,
            cancelled = self.summary.cancelled,
            late = self.summary.late,
            "Race drained"
        );
        self.summary
    }
}

async fn fetch(
    client: reqwest::Client,
    endpoint: Endpoint,
    identifier: String,
    headers: HeaderMap,
    timeout: Duration,
    cancel: CancellationToken,
) -> (Endpoint, FetchOutcome) {
    let url = match endpoint.url_for(&identifier) {
        Ok(url) => url,
        Err(e) => return (endpoint, FetchOutcome::Failed(e.into())),
    };

    let request = client.get(url).headers(headers).timeout(timeout).send();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(host = endpoint.host(), "Cancelling request");
            FetchOutcome::Cancelled
        }
        result = request => match result {
            Ok(response) if response.status() == StatusCode::OK => {
                tracing::debug!(host = endpoint.host(), "Got content");
                FetchOutcome::Delivered(response)
            }
            Ok(response) => FetchOutcome::Rejected(response.status()),
            Err(e) => FetchOutcome::Failed(FetchError::Transport(e)),
        },
    };
    (endpoint, outcome)
}
