//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Both proxies produce:
//!     → logging.rs (structured log events, gating audit lines)
//!     → metrics.rs (optional Prometheus counters and gauges)
//! The bridge additionally keeps:
//!     → stats.rs (in-process counters served on /status)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - `/status` counters are independent of the metrics exporter
//! - Nothing here survives a restart

pub mod logging;
pub mod metrics;
pub mod stats;

pub use stats::{StatCounters, StatKind, StatSnapshot};
