//! Single-mirror liveness probe.
//!
//! A mirror passes only if it answers the well-known probe identifier with
//! `200 OK` and the exact expected body, within the timeout.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::time;

use crate::config::LivenessConfig;
use crate::pool::{Endpoint, EndpointError};

/// Longest body excerpt carried in a mismatch error.
const EXCERPT_LEN: usize = 64;

/// Why a mirror failed its probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("bad response code: {0}")]
    Status(StatusCode),
    #[error("unexpected body {0:?}")]
    BodyMismatch(String),
    #[error("body longer than the expected {0} bytes")]
    BodyTooLarge(usize),
    #[error("probe task failed: {0}")]
    Task(String),
}

/// Outcome of probing one endpoint during a sweep.
#[derive(Debug)]
pub struct ProbeResult {
    pub endpoint: Endpoint,
    pub outcome: Result<(), ProbeError>,
}

impl ProbeResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Known-content check shared by every probe in a sweep.
#[derive(Debug, Clone)]
pub struct Probe {
    client: reqwest::Client,
    cid: String,
    expected: String,
    timeout: Duration,
}

impl Probe {
    pub fn new(client: reqwest::Client, config: &LivenessConfig) -> Self {
        Self {
            client,
            cid: config.probe_cid.clone(),
            expected: config.probe_body.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe one endpoint. The timeout covers connect, headers and body.
    ///
    /// The body is read chunk by chunk and abandoned as soon as it outgrows
    /// the expected body.
    pub async fn check(&self, endpoint: &Endpoint) -> Result<(), ProbeError> {
        let url = endpoint.url_for(&self.cid)?;
        let limit = self.expected.len();

        let body = async {
            let mut response = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, "ipfs-relay-liveness-check")
                .send()
                .await
                .map_err(ProbeError::Transport)?;

            if response.status() != StatusCode::OK {
                return Err(ProbeError::Status(response.status()));
            }
            if response.content_length().is_some_and(|len| len > limit as u64) {
                return Err(ProbeError::BodyTooLarge(limit));
            }

            let mut body = Vec::with_capacity(limit);
            while let Some(chunk) = response.chunk().await.map_err(ProbeError::Transport)? {
                if body.len() + chunk.len() > limit {
                    return Err(ProbeError::BodyTooLarge(limit));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(body)
        };

        let body = time::timeout(self.timeout, body)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        if body != self.expected.as_bytes() {
            let excerpt: String = String::from_utf8_lossy(&body).chars().take(EXCERPT_LEN).collect();
            return Err(ProbeError::BodyMismatch(excerpt));
        }
        Ok(())
    }
}
