//! HTTP side of the bridge.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → handlers.rs (method check, body decode, counters)
//!     → kafka::MessageForwarder (publish)
//!     → response (200 empty / 400 / 500 with error text)
//! ```

pub mod handlers;
pub mod server;

pub use server::{BridgeServer, BridgeState};
