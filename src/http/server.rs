//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler
//! - Wire up middleware (request ID, tracing, CORS header)
//! - Bind server to listener with graceful shutdown
//! - Wait for background race drains before returning

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::http::handler::relay_handler;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::race::Dispatcher;

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    dispatcher: Dispatcher,
}

impl RelayServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let router = Self::build_router(dispatcher.clone());
        Self { router, dispatcher }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(dispatcher: Dispatcher) -> Router {
        Router::new()
            .route("/ipfs/", get(relay_handler))
            .route("/ipfs/{*identifier}", get(relay_handler))
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(SetResponseHeaderLayer::overriding(
                        header::ACCESS_CONTROL_ALLOW_ORIGIN,
                        HeaderValue::from_static("*"),
                    )),
            )
    }

    /// The router, for driving the relay without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then wait for outstanding race drains.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(pending = self.dispatcher.pending_drains(), "HTTP server stopped, draining races");
        self.dispatcher.drained().await;
        Ok(())
    }
}
