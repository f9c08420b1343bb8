//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use addr_proxies::config::SocksListenerConfig;
use addr_proxies::kafka::{Producer, TransportError};
use addr_proxies::lifecycle::Shutdown;
use addr_proxies::net::Listener;
use addr_proxies::socks::{AllowListRule, GatingProxy};

/// Producer that keeps every published value in memory.
#[derive(Default)]
pub struct RecordingProducer {
    pub published: Mutex<Vec<Vec<u8>>>,
    pub closed: AtomicBool,
}

impl RecordingProducer {
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published.lock().unwrap().clone()
    }
}

impl Producer for RecordingProducer {
    fn publish(&self, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            // Yield so concurrent publishes actually interleave.
            tokio::task::yield_now().await;
            self.published.lock().unwrap().push(value);
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.closed.store(true, Ordering::SeqCst) })
    }
}

/// Producer whose broker always rejects.
pub struct FailingProducer(pub &'static str);

impl Producer for FailingProducer {
    fn publish(&self, _value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move { Err(TransportError::Other(self.0.to_string())) })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// An upstream TCP server that echoes bytes and counts accepted connections.
pub struct Upstream {
    pub addr: SocketAddr,
    pub accepted: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

pub async fn start_echo_server(bind: SocketAddr) -> Upstream {
    let listener = TcpListener::bind(bind).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    Upstream { addr, accepted }
}

/// Start a gating proxy on an ephemeral loopback port.
pub async fn start_gating_proxy(rule: AllowListRule) -> (SocketAddr, Shutdown) {
    let config = SocksListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_connections: 64,
    };
    let listener = Listener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let proxy = GatingProxy::new(Arc::new(rule));
    tokio::spawn(async move { proxy.run(listener, shutdown_rx).await });

    (addr, shutdown)
}

/// SOCKS5 destination as sent by the client.
pub enum Target<'a> {
    Ip(SocketAddr),
    Domain(&'a str, u16),
}

pub const CMD_CONNECT: u8 = 0x01;
pub const CMD_BIND: u8 = 0x02;

pub const REPLY_SUCCEEDED: u8 = 0x00;
pub const REPLY_NOT_ALLOWED: u8 = 0x02;
pub const REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;

/// Negotiate "no authentication" with the proxy.
pub async fn socks_handshake(proxy: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await.unwrap();
    assert_eq!(choice, [0x05, 0x00]);
    stream
}

/// Send a request and return the reply code. On success the bound address
/// is consumed so the stream is positioned at tunnel data.
pub async fn socks_request(stream: &mut TcpStream, command: u8, target: Target<'_>) -> u8 {
    let mut request = vec![0x05, command, 0x00];
    match target {
        Target::Ip(SocketAddr::V4(addr)) => {
            request.push(0x01);
            request.extend_from_slice(&addr.ip().octets());
            request.extend_from_slice(&addr.port().to_be_bytes());
        }
        Target::Ip(SocketAddr::V6(addr)) => {
            request.push(0x04);
            request.extend_from_slice(&addr.ip().octets());
            request.extend_from_slice(&addr.port().to_be_bytes());
        }
        Target::Domain(name, port) => {
            request.push(0x03);
            request.push(name.len() as u8);
            request.extend_from_slice(name.as_bytes());
            request.extend_from_slice(&port.to_be_bytes());
        }
    }
    stream.write_all(&request).await.unwrap();

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(header[0], 0x05);
    let reply = header[1];

    if reply == REPLY_SUCCEEDED {
        let remaining = match header[3] {
            0x01 => 4 + 2,
            0x04 => 16 + 2,
            other => panic!("unexpected bound address type {other}"),
        };
        let mut bound = vec![0u8; remaining];
        stream.read_exact(&mut bound).await.unwrap();
    }
    reply
}
