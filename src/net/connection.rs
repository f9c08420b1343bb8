//! Per-connection bookkeeping for the gating proxy.
//!
//! # Responsibilities
//! - Name the states a proxied connection moves through
//! - Hand out ids for log spans
//! - Count open connections and record where each one ended

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Identifier of one accepted connection, unique per tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a proxied connection is in its lifecycle.
///
/// ```text
/// Received → Evaluating → Tunneling → Closed
///                       ↘ Denied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted; handshake in progress.
    Received,
    /// Destination known; rule is deciding.
    Evaluating,
    /// Upstream connected; relaying bytes.
    Tunneling,
    /// Rule denied; closed without an upstream attempt.
    Denied,
    /// Tunnel ended, or the connection failed before tunneling.
    Closed,
}

impl ConnectionState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Denied | Self::Closed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    next_id: AtomicU64,
    open: AtomicU64,
}

/// Counts the connections currently being served.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counters: Arc<Counters>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accepted connection. The count drops with the guard.
    pub fn track(&self) -> ConnectionGuard {
        let id = ConnectionId(self.counters.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened();
        ConnectionGuard {
            counters: Arc::clone(&self.counters),
            id,
            state: ConnectionState::Received,
        }
    }

    /// Connections accepted and not yet finished.
    pub fn active_count(&self) -> u64 {
        self.counters.open.load(Ordering::SeqCst)
    }
}

/// Holds one slot in a [`ConnectionTracker`] for the life of a connection.
#[derive(Debug)]
pub struct ConnectionGuard {
    counters: Arc<Counters>,
    id: ConnectionId,
    state: ConnectionState,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Record the state the connection reached.
    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed();
        if self.state.is_terminal() {
            tracing::trace!(connection_id = %self.id, state = ?self.state, "Connection released");
        } else {
            tracing::debug!(
                connection_id = %self.id,
                state = ?self.state,
                "Connection released before finishing"
            );
        }
    }
}
