//! Network layer for the gating proxy.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (id, open count, final state)
//!     → Hand off to socks::GatingProxy
//!
//! Connection States:
//!     Received → Evaluating → Tunneling → Closed
//!                           ↘ Denied
//! ```
//!
//! # Design Decisions
//! - At most `max_connections` clients are served at once
//! - Each connection carries an id for its log span

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Accepted, ConnectionPermit, Listener, ListenerError};
