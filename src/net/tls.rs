use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::digest::{digest, SHA256};
use tracing::info;
use wtransport::Identity;

use crate::config::ServerConfig;

// Dev certificate paths (generated by scripts/gen-dev-cert)
const DEV_CERT_FILE: &str = "certs/cert.pem";
const DEV_KEY_FILE: &str = "certs/key.pem";

/// TLS identity for the WebTransport relay
pub struct TlsConfig {
    pub identity: Identity,
    /// Base64-encoded SHA-256 of the leaf certificate, for browser pinning
    pub cert_hash: String,
}

/// Which PEM pair to load
fn pem_paths(config: &ServerConfig) -> Result<(String, String)> {
    match (&config.tls_cert_path, &config.tls_key_path) {
        (Some(cert), Some(key)) => Ok((cert.clone(), key.clone())),
        (None, None) if Path::new(DEV_CERT_FILE).exists() && Path::new(DEV_KEY_FILE).exists() => {
            Ok((DEV_CERT_FILE.to_string(), DEV_KEY_FILE.to_string()))
        }
        (None, None) => Err(anyhow!(
            "TLS certificate not found.\n\n\
            For development: run scripts/gen-dev-cert to create certs/.\n\
            For production: set TLS_CERT_PATH and TLS_KEY_PATH."
        )),
        _ => Err(anyhow!("TLS_CERT_PATH and TLS_KEY_PATH must be set together")),
    }
}

impl TlsConfig {
    /// Load the identity named by the config, falling back to certs/
    pub async fn load(config: &ServerConfig) -> Result<Self> {
        let (cert_path, key_path) = pem_paths(config)?;
        info!(cert = %cert_path, "Loading TLS certificate");
        Self::load_from_paths(&cert_path, &key_path).await
    }

    async fn load_from_paths(cert_path: &str, key_path: &str) -> Result<Self> {
        let identity = Identity::load_pemfiles(cert_path, key_path)
            .await
            .with_context(|| format!("Failed to load certificate from {cert_path} / {key_path}"))?;

        let cert_hash = identity
            .certificate_chain()
            .as_slice()
            .first()
            .map(|cert| fingerprint(cert.der()))
            .ok_or_else(|| anyhow!("Certificate chain in {cert_path} is empty"))?;

        info!("Certificate hash: {}", cert_hash);
        info!(
            "Chrome flag: --ignore-certificate-errors-spki-list={}",
            cert_hash
        );

        Ok(Self {
            identity,
            cert_hash,
        })
    }

    pub fn cert_hash(&self) -> &str {
        &self.cert_hash
    }
}

/// SHA-256 of DER bytes, base64 encoded
pub fn fingerprint(der: &[u8]) -> String {
    STANDARD.encode(digest(&SHA256, der).as_ref())
}
