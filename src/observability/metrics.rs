//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): requests seen on `/addresses`
//! - `bridge_forwards_total` (counter): forwards by `outcome` (success, failure)
//! - `gate_decisions_total` (counter): gating decisions by `decision`
//! - `gate_active_connections` (gauge): open SOCKS connections
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_bridge_request() {
    counter!("bridge_requests_total").increment(1);
}

pub fn record_forward(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("bridge_forwards_total", "outcome" => outcome).increment(1);
}

pub fn record_decision(allowed: bool) {
    let decision = if allowed { "allow" } else { "deny" };
    counter!("gate_decisions_total", "decision" => decision).increment(1);
}

pub fn connection_opened() {
    gauge!("gate_active_connections").increment(1.0);
}

pub fn connection_closed() {
    gauge!("gate_active_connections").decrement(1.0);
}
