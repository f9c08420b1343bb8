//! Configuration schema definitions.
//!
//! This module defines the configuration structure for both proxies.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable holding the comma-separated Kafka broker list.
pub const ENV_KAFKA_BROKERS: &str = "KAFKA_BROKERS";

/// Root configuration for the HTTP-to-Kafka bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// HTTP listener configuration.
    pub listener: HttpListenerConfig,

    /// Broker connection settings.
    pub kafka: KafkaConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Root configuration for the SOCKS5 gating proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// TCP listener configuration.
    pub listener: SocksListenerConfig,

    /// Destinations the proxy is willing to tunnel to.
    pub allow_list: AllowListConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8081").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for HttpListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8081".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Kafka producer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Bootstrap brokers. Overridden by `KAFKA_BROKERS` when set.
    pub brokers: Vec<String>,

    /// Topic every submission is published to.
    pub topic: String,

    /// Partition every submission is published to.
    pub partition: i32,

    /// Client certificate material for the broker connection.
    pub tls: KafkaTlsConfig,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: Vec::new(),
            topic: "antifraud_client_addrs_events.testing.repsys.upstream".to_string(),
            partition: 0,
            tls: KafkaTlsConfig::default(),
        }
    }
}

/// TLS material for the broker connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaTlsConfig {
    /// Path to the client certificate chain (PEM).
    pub cert_path: String,

    /// Path to the client private key (PEM).
    pub key_path: String,

    /// Optional CA bundle (PEM). Web PKI roots are used when absent.
    pub ca_path: Option<String>,
}

impl Default for KafkaTlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "/etc/kafka/secrets/certificate".to_string(),
            key_path: "/etc/kafka/secrets/key".to_string(),
            ca_path: None,
        }
    }
}

/// SOCKS5 listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocksListenerConfig {
    /// Bind address (e.g., "0.0.0.0:1080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for SocksListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Static allow-lists for the gating proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AllowListConfig {
    /// Destination IP addresses, e.g. the Kafka cluster.
    pub ips: Vec<String>,

    /// Destination FQDNs, e.g. Let's Encrypt's ACME endpoint.
    pub fqdns: Vec<String>,
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            ips: Vec::new(),
            fqdns: vec!["acme-v02.api.letsencrypt.org".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
