//! SOCKS5 gating proxy.
//!
//! # Responsibilities
//! - Accept connections (bounded) and hand each to its own task
//! - Run the SOCKS5 handshake through `fast-socks5`
//! - Ask the [`Rule`] before any upstream connection is attempted
//! - Relay bytes both ways until either side closes
//!
//! # Design Decisions
//! - Domain names are resolved before evaluation, so rules see both the
//!   requested name and the address that would be dialed
//! - Denied connections get a "connection not allowed" reply and are closed
//! - Upstream failures are reported to the client and logged, never retried

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fast_socks5::server::Socks5ServerProtocol;
use fast_socks5::util::target_addr::TargetAddr;
use fast_socks5::{ReplyError, Socks5Command};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::net::{Accepted, ConnectionState, ConnectionTracker, Listener, ListenerError};
use crate::socks::rule::{ConnectionRequest, Endpoint, Rule};

/// Why a proxied connection ended abnormally.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("SOCKS5 handshake failed: {0}")]
    Handshake(String),

    #[error("unsupported SOCKS5 command")]
    UnsupportedCommand,

    #[error("failed to resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    #[error("no addresses found for {0}")]
    NoAddress(String),

    #[error("failed to connect to {target}: {source}")]
    Connect { target: SocketAddr, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn handshake<E: std::fmt::Display>(e: E) -> GateError {
    GateError::Handshake(e.to_string())
}

/// Connection-gating SOCKS5 proxy.
pub struct GatingProxy {
    rule: Arc<dyn Rule>,
    tracker: ConnectionTracker,
}

impl GatingProxy {
    pub fn new(rule: Arc<dyn Rule>) -> Self {
        Self {
            rule,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Open connections.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Accept connections on `listener` until `shutdown` fires.
    ///
    /// Tunnels already established keep running on their own tasks.
    pub async fn run(&self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                max_connections = listener.max_connections(),
                "Starting SOCKSv5 server"
            );
        }

        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => accepted,
            };

            let Accepted { stream, peer, permit } = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Closed) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            let rule = Arc::clone(&self.rule);
            let mut guard = self.tracker.track();
            let span = tracing::info_span!("socks", connection_id = %guard.id(), peer = %peer);
            tokio::spawn(
                async move {
                    let _permit = permit;
                    match serve_connection(rule.as_ref(), stream, peer).await {
                        Ok(state) => guard.set_state(state),
                        Err(e) => {
                            tracing::warn!(error = %e, "Connection failed");
                            guard.set_state(ConnectionState::Closed);
                        }
                    }
                    tracing::debug!(state = ?guard.state(), "Connection finished");
                }
                .instrument(span),
            );
        }

        tracing::info!("SOCKSv5 server stopped accepting");
    }
}

/// Drive one client connection to a terminal state.
pub async fn serve_connection(
    rule: &dyn Rule,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<ConnectionState, GateError> {
    tracing::trace!(state = ?ConnectionState::Received);

    let (proto, command, target) = Socks5ServerProtocol::accept_no_auth(stream)
        .await
        .map_err(handshake)?
        .read_command()
        .await
        .map_err(handshake)?;

    if !matches!(command, Socks5Command::TCPConnect) {
        proto
            .reply_error(&ReplyError::CommandNotSupported)
            .await
            .map_err(handshake)?;
        return Err(GateError::UnsupportedCommand);
    }

    let destination = match resolve(target).await {
        Ok(destination) => destination,
        Err(e) => {
            proto
                .reply_error(&ReplyError::HostUnreachable)
                .await
                .map_err(handshake)?;
            return Err(e);
        }
    };

    let request = ConnectionRequest {
        source: Endpoint::from(peer),
        destination,
    };

    tracing::trace!(state = ?ConnectionState::Evaluating);
    if !rule.evaluate(&request).is_allowed() {
        proto
            .reply_error(&ReplyError::ConnectionNotAllowed)
            .await
            .map_err(handshake)?;
        return Ok(ConnectionState::Denied);
    }

    let target = request.destination.socket_addr();
    let mut upstream = match TcpStream::connect(target).await {
        Ok(upstream) => upstream,
        Err(source) => {
            proto
                .reply_error(&reply_for_connect_error(&source))
                .await
                .map_err(handshake)?;
            return Err(GateError::Connect { target, source });
        }
    };

    let bound = upstream.local_addr()?;
    let mut client = proto.reply_success(bound).await.map_err(handshake)?;

    tracing::trace!(state = ?ConnectionState::Tunneling, upstream = %target);
    let (sent, received) = tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    tracing::debug!(sent, received, "Tunnel closed");

    Ok(ConnectionState::Closed)
}

/// Turn the requested target into an endpoint with a concrete IP.
async fn resolve(target: TargetAddr) -> Result<Endpoint, GateError> {
    match target {
        TargetAddr::Ip(addr) => Ok(Endpoint::from(addr)),
        TargetAddr::Domain(host, port) => {
            let addr = tokio::net::lookup_host((host.as_str(), port))
                .await
                .map_err(|source| GateError::Resolve {
                    host: host.clone(),
                    source,
                })?
                .next()
                .ok_or_else(|| GateError::NoAddress(host.clone()))?;
            Ok(Endpoint::from(addr).with_fqdn(host))
        }
    }
}

fn reply_for_connect_error(err: &io::Error) -> ReplyError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ReplyError::ConnectionRefused,
        _ => ReplyError::HostUnreachable,
    }
}
