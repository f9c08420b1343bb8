//! Bounded TCP acceptor for the gating proxy.
//!
//! At most `max_connections` clients are served at once. Once the limit is
//! reached `accept` waits for a slot before taking the next connection off the
//! socket backlog.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::SocksListenerConfig;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("failed to accept connection: {0}")]
    Accept(io::Error),

    #[error("connection slots closed")]
    Closed,
}

/// A client connection together with the slot it occupies.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub permit: ConnectionPermit,
}

/// Listening socket plus a fixed pool of connection slots.
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    pub async fn bind(config: &SocksListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let socket = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "SOCKS listener bound"
        );

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Wait for a free slot, then for the next client.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;
        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer = %peer,
            free_slots = self.slots.available_permits(),
            "Client accepted"
        );

        Ok(Accepted {
            stream,
            peer,
            permit: ConnectionPermit { _slot: permit },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Slots not currently held by a connection.
    pub fn available_permits(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// One occupied connection slot, released on drop.
#[derive(Debug)]
pub struct ConnectionPermit {
    _slot: OwnedSemaphorePermit,
}
