//! TLS material for the broker connection.
//!
//! Loads the client certificate chain and key (PEM) and builds the rustls
//! client configuration used by the Kafka producer.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, PrivateKey, RootCertStore};

use crate::config::{ConfigError, KafkaTlsConfig};

/// Build the client TLS configuration from certificate and key files.
pub fn load_client_config(config: &KafkaTlsConfig) -> Result<ClientConfig, ConfigError> {
    let certs = load_certs(Path::new(&config.cert_path))?;
    let key = load_private_key(Path::new(&config.key_path))?;

    let roots = match &config.ca_path {
        Some(ca_path) => load_roots(Path::new(ca_path))?,
        None => web_pki_roots(),
    };

    let client_config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, key)
        .map_err(|e| ConfigError::Tls(format!("invalid certificate or key: {}", e)))?;

    tracing::info!(
        cert_path = %config.cert_path,
        key_path = %config.key_path,
        "Loaded certificate and key file for Kafka"
    );
    Ok(client_config)
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Tls(format!("{} file not found: {:?}", what, path)));
    }
    let file = File::open(path)
        .map_err(|e| ConfigError::Tls(format!("failed to open {:?}: {}", path, e)))?;
    Ok(BufReader::new(file))
}

fn load_certs(path: &Path) -> Result<Vec<Certificate>, ConfigError> {
    let mut reader = open(path, "Certificate")?;
    let certs = rustls_pemfile::certs(&mut reader)
        .map(|cert| cert.map(|der| Certificate(der.to_vec())))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Tls(format!("failed to parse {:?}: {}", path, e)))?;

    if certs.is_empty() {
        return Err(ConfigError::Tls(format!("no certificates found in {:?}", path)));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKey, ConfigError> {
    let mut reader = open(path, "Private key")?;
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ConfigError::Tls(format!("failed to parse {:?}: {}", path, e)))?
        .ok_or_else(|| ConfigError::Tls(format!("no private key found in {:?}", path)))?;
    Ok(PrivateKey(key.secret_der().to_vec()))
}

fn load_roots(path: &Path) -> Result<RootCertStore, ConfigError> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots
            .add(&cert)
            .map_err(|e| ConfigError::Tls(format!("invalid CA certificate in {:?}: {}", path, e)))?;
    }
    Ok(roots)
}

fn web_pki_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(ta.subject, ta.spki, ta.name_constraints)
    }));
    roots
}
