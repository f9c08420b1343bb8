//! Kafka side of the bridge.
//!
//! # Data Flow
//! ```text
//! decoded submission (WalletAddressSet)
//!     → forwarder.rs (encode to wire format)
//!     → producer.rs (publish one record, fixed topic, no key)
//!     → broker (TLS, client certificate from tls.rs)
//! ```

pub mod forwarder;
pub mod message;
pub mod producer;
pub mod tls;

pub use forwarder::{ForwardError, MessageForwarder};
pub use message::WalletAddressSet;
pub use producer::{KafkaProducer, Producer, TransportError};
