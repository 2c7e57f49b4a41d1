//! Header plumbing between the client and the winning mirror.
//!
//! # Responsibilities
//! - Pick which inbound headers are forwarded to mirrors
//! - Copy the winner's status and headers (all values of every key)
//! - Stream the winner's body without buffering
//! - Map dispatcher errors to HTTP responses

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::race::{RelayError, Winner};

/// Connection-scoped headers that must not cross the relay.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Inbound headers to send upstream. `Host` and the body length belong to
/// the inbound exchange and are left for the client to set.
pub fn forwarded_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name) || *name == header::HOST || *name == header::CONTENT_LENGTH {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Append every end-to-end header from `src` onto `dst`, keeping repeats.
pub fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src {
        if is_hop_by_hop(name) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

/// Build the client response from the winning mirror.
pub fn winner_response(winner: Winner) -> Response {
    let status = winner.response.status();
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    copy_headers(winner.response.headers(), response.headers_mut());
    *response.body_mut() = Body::from_stream(winner.response.bytes_stream());
    response
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Redirect { location } => match HeaderValue::try_from(location) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                Err(_) => (StatusCode::BAD_REQUEST, "bad ipfs path").into_response(),
            },
            RelayError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            RelayError::EmptyPool => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response(),
            RelayError::NoWinner { .. } => (StatusCode::BAD_GATEWAY, self.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarding_drops_host_and_hop_by_hop() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("relay.local"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("*/*"));

        let forwarded = forwarded_request_headers(&inbound);
        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert!(forwarded.get("keep-alive").is_none());
        assert_eq!(forwarded.get(header::RANGE).unwrap(), "bytes=0-99");
        assert_eq!(forwarded.get_all(header::ACCEPT).iter().count(), 2);
    }

    #[test]
    fn copy_keeps_multi_value_headers() {
        let mut src = HeaderMap::new();
        src.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        src.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        src.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        src.insert(header::ETAG, HeaderValue::from_static("\"Qm\""));

        let mut dst = HeaderMap::new();
        copy_headers(&src, &mut dst);

        let cookies: Vec<_> = dst
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(dst.get(header::ETAG).unwrap(), "\"Qm\"");
        assert!(dst.get(header::TRANSFER_ENCODING).is_none());
    }

    #[test]
    fn errors_map_to_distinct_statuses() {
        let redirect = RelayError::Redirect { location: "/ipfs/abc/".into() }.into_response();
        assert_eq!(redirect.status(), StatusCode::FOUND);
        assert_eq!(redirect.headers()[header::LOCATION], "/ipfs/abc/");

        assert_eq!(
            RelayError::InvalidIdentifier("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::EmptyPool.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            RelayError::NoWinner { identifier: "x/y".into(), attempted: 3 }.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
