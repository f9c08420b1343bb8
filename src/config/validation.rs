//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse (listen addresses, allow-listed IPs)
//! - Validate value ranges (body limits, connection limits)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::{BridgeConfig, GateConfig};

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listen address {0:?}")]
    InvalidBindAddress(String),

    #[error("environment variable \"KAFKA_BROKERS\" not set")]
    MissingBrokers,

    #[error("broker address must not be empty")]
    EmptyBroker,

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("partition must be non-negative, got {0}")]
    NegativePartition(i32),

    #[error("max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("max_connections must be greater than zero")]
    ZeroConnectionLimit,

    #[error("invalid allow-listed IP address {0:?}")]
    InvalidAllowedIp(String),

    #[error("allow-listed FQDN must not be empty")]
    EmptyAllowedFqdn,
}

/// Validate the bridge configuration. Brokers must already be resolved.
pub fn validate_bridge_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.kafka.brokers.is_empty() {
        errors.push(ValidationError::MissingBrokers);
    }
    if config.kafka.brokers.iter().any(|b| b.trim().is_empty()) {
        errors.push(ValidationError::EmptyBroker);
    }
    if config.kafka.topic.is_empty() {
        errors.push(ValidationError::EmptyTopic);
    }
    if config.kafka.partition < 0 {
        errors.push(ValidationError::NegativePartition(config.kafka.partition));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the gating proxy configuration.
pub fn validate_gate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnectionLimit);
    }
    for ip in &config.allow_list.ips {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::InvalidAllowedIp(ip.clone()));
        }
    }
    if config.allow_list.fqdns.iter().any(|f| f.is_empty()) {
        errors.push(ValidationError::EmptyAllowedFqdn);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
