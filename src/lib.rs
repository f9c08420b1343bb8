//! Network intermediaries in front of the protected backend.
//!
//! - `kafka-proxy`: an HTTP-to-Kafka bridge. Clients POST anonymized address
//!   sets; each one is published to a fixed topic over mutually authenticated TLS.
//! - `socks-proxy`: a SOCKS5 proxy that only tunnels to allow-listed
//!   destinations and logs every decision.
//!
//! # Architecture Overview
//!
//! ```text
//!   client ── POST /addresses ──▶ http ──▶ kafka::MessageForwarder ──▶ broker
//!                                  │
//!                                  └──▶ observability::StatCounters ◀── GET /status
//!
//!   client ── SOCKS5 ──▶ net::Listener ──▶ socks::GatingProxy ──▶ destination
//!                                               │
//!                                               └──▶ socks::Rule (allow / deny)
//! ```

// Bridge
pub mod http;
pub mod kafka;

// Gating proxy
pub mod net;
pub mod socks;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{BridgeConfig, GateConfig};
pub use http::BridgeServer;
pub use lifecycle::Shutdown;
pub use socks::GatingProxy;
