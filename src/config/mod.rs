//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional) + environment + CLI flags
//!     → loader.rs (parse & deserialize, KAFKA_BROKERS override)
//!     → CLI overrides (binaries, `override_tls_paths`)
//!     → validation.rs (semantic checks, once)
//!     → BridgeConfig / GateConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the allow-list never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any configuration error is fatal before serving starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_bridge_config, load_gate_config, override_tls_paths, ConfigError};
pub use schema::{
    AllowListConfig, BridgeConfig, GateConfig, HttpListenerConfig, KafkaConfig, KafkaTlsConfig,
    ObservabilityConfig, SocksListenerConfig,
};
