//! SOCKS5 connection gating.
//!
//! # Data Flow
//! ```text
//! client
//!     → net::Listener (bounded accept)
//!     → proxy.rs (handshake, resolve, build ConnectionRequest)
//!     → rule.rs (allow/deny, audit log)
//!     → tunnel to destination | "connection not allowed" + close
//! ```

pub mod proxy;
pub mod rule;

pub use proxy::{serve_connection, GateError, GatingProxy};
pub use rule::{AllowListRule, ConnectionRequest, Decision, Endpoint, Rule};
