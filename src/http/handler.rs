//! The `/ipfs/` relay handler.

use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::http::response::winner_response;
use crate::observability::metrics;
use crate::race::{Dispatcher, RelayError};

/// Validate, race, and answer one request.
pub async fn relay_handler(State(dispatcher): State<Dispatcher>, uri: Uri, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let path = uri.path();
    let request_id = request_id(&headers);

    let result = match dispatcher.identifier(path) {
        Ok(identifier) => dispatcher.race(identifier, &headers).await,
        Err(e) => Err(e),
    };

    let (outcome, response) = match result {
        Ok(winner) => {
            tracing::debug!(request_id = %request_id, endpoint = %winner.endpoint, "Forwarding winner");
            ("won", winner_response(winner))
        }
        Err(e) => {
            if matches!(e, RelayError::EmptyPool | RelayError::NoWinner { .. }) {
                tracing::warn!(request_id = %request_id, path = %path, error = %e, "Relay failed");
            } else {
                tracing::debug!(request_id = %request_id, path = %path, error = %e, "Request not raced");
            }
            (e.outcome(), e.into_response())
        }
    };

    metrics::record_request(outcome, start);
    tracing::info!(
        request_id = %request_id,
        path = %path.trim_start_matches('/'),
        status = response.status().as_u16(),
        elapsed = ?start.elapsed(),
        "Relayed request"
    );
    response
}
