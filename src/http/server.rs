//! HTTP server setup for the bridge.
//!
//! # Responsibilities
//! - Create Axum Router with both endpoints
//! - Wire up middleware (tracing, request ID)
//! - Serve until shutdown, then close the producer

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::HttpListenerConfig;
use crate::http::handlers::{status, submit_addresses};
use crate::kafka::MessageForwarder;
use crate::observability::StatCounters;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct BridgeState {
    pub stats: Arc<StatCounters>,
    pub forwarder: MessageForwarder,
    pub max_body_size: usize,
}

/// HTTP-to-Kafka bridge server.
pub struct BridgeServer {
    router: Router,
    state: BridgeState,
}

impl BridgeServer {
    /// Create a new bridge publishing through `forwarder`.
    pub fn new(config: &HttpListenerConfig, forwarder: MessageForwarder) -> Self {
        let state = BridgeState {
            stats: Arc::new(StatCounters::new()),
            forwarder,
            max_body_size: config.max_body_size,
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: BridgeState) -> Router {
        Router::new()
            .route("/addresses", any(submit_addresses))
            .route("/status", get(status))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving or driving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Counters shared with the handlers.
    pub fn stats(&self) -> Arc<StatCounters> {
        Arc::clone(&self.state.stats)
    }

    /// Serve on `listener` until `shutdown` fires, then close the producer.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Starting Kafka proxy");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        self.state.forwarder.close().await;
        tracing::info!("HTTP server stopped");
        served
    }
}
