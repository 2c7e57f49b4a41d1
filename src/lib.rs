//! Content-addressed IPFS relay library.
//!
//! Requests for `/ipfs/<cid>/<path>` are raced across a pool of public
//! mirrors; the first `200 OK` is streamed back and the losing requests are
//! cancelled. A background liveness checker keeps the pool down to mirrors
//! that serve a known probe file correctly.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod race;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
