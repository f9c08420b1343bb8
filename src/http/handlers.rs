//! Bridge endpoints.
//!
//! - `/addresses`: submissions of freshly anonymized addresses, forwarded to Kafka
//! - `/status`: plaintext statistics report

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::server::BridgeState;
use crate::kafka::WalletAddressSet;
use crate::observability::{metrics, StatKind};

/// Decode a submission and forward it to the broker.
///
/// Each request publishes exactly the set decoded from its own body.
pub async fn submit_addresses(State(state): State<BridgeState>, request: Request) -> Response {
    state.stats.increment(StatKind::Requests);
    metrics::record_bridge_request();

    if request.method() != Method::POST {
        tracing::debug!(method = %request.method(), "Rejecting non-POST submission");
        return (StatusCode::BAD_REQUEST, "only POST requests are accepted").into_response();
    }

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read submission body");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let payload = match WalletAddressSet::from_json(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed submission");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match state.forwarder.forward(&payload).await {
        Ok(()) => {
            state.stats.increment(StatKind::GoodForwards);
            metrics::record_forward(true);
            tracing::debug!(keys = payload.len(), "Forwarded submission");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            state.stats.increment(StatKind::BadForwards);
            metrics::record_forward(false);
            tracing::error!(error = %e, "Failed to forward addresses");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to forward addresses: {}", e),
            )
                .into_response()
        }
    }
}

/// Render the bridge counters, one labeled line each.
pub async fn status(State(state): State<BridgeState>) -> String {
    state.stats.snapshot().to_string()
}
