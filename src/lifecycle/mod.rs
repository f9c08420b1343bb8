//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → listeners stop accepting → bridge drains and closes producer
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then broker connection, then listeners
//! - Any startup error is fatal before serving begins

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
