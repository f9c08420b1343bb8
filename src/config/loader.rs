//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::{BridgeConfig, GateConfig, KafkaTlsConfig, ENV_KAFKA_BROKERS};
use crate::config::validation::ValidationError;

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0:?} empty")]
    EmptyEnv(&'static str),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("TLS material error: {0}")]
    Tls(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_toml<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(T::default()),
    }
}

/// Parse the value of `KAFKA_BROKERS` into a broker list.
///
/// `None` means the variable is unset and the file's brokers are kept.
pub fn brokers_from_env(value: Option<String>) -> Result<Option<Vec<String>>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let brokers: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect();
    if brokers.is_empty() {
        return Err(ConfigError::EmptyEnv(ENV_KAFKA_BROKERS));
    }
    Ok(Some(brokers))
}

/// Load the bridge configuration from an optional TOML file and the environment.
///
/// Not validated: callers apply command-line overrides first.
pub fn load_bridge_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let mut config: BridgeConfig = read_toml(path)?;

    if let Some(brokers) = brokers_from_env(std::env::var(ENV_KAFKA_BROKERS).ok())? {
        tracing::info!(brokers = ?brokers, "Fetched Kafka brokers from environment variable");
        config.kafka.brokers = brokers;
    }

    Ok(config)
}

/// Load the gating proxy configuration from an optional TOML file.
///
/// Not validated: callers apply command-line overrides first.
pub fn load_gate_config(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    read_toml(path)
}

/// Apply `--cert`/`--key` to the TLS paths.
///
/// Only a complete pair replaces the paths. Otherwise the configured paths
/// (the defaults unless the file sets them) stay and the fallback is logged.
/// Returns whether the pair was applied.
pub fn override_tls_paths(
    tls: &mut KafkaTlsConfig,
    cert: Option<String>,
    key: Option<String>,
) -> bool {
    match (cert, key) {
        (Some(cert), Some(key)) => {
            tls.cert_path = cert;
            tls.key_path = key;
            true
        }
        (None, None) => {
            tracing::info!(
                cert = %tls.cert_path,
                key = %tls.key_path,
                "Arguments --cert and --key not set, using configured paths"
            );
            false
        }
        _ => {
            tracing::warn!(
                cert = %tls.cert_path,
                key = %tls.key_path,
                "Arguments --cert and --key must be set together, using configured paths"
            );
            false
        }
    }
}
