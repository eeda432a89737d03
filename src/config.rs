use std::str::FromStr;

use crate::game::constants::net::MAX_MESSAGE_SIZE;

/// Frames smaller than this cannot carry a full brick field
const MIN_MESSAGE_SIZE: usize = 1024;
const MAX_ROOMS_LIMIT: usize = 100_000;

/// Relay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// WebTransport port (dual-stack bind)
    pub port: u16,
    /// Maximum number of concurrent rooms
    pub max_rooms: usize,
    /// Port for the metrics HTTP endpoint
    pub metrics_port: u16,
    /// Largest accepted frame payload in bytes
    pub max_message_size: usize,
    /// Path to TLS certificate file
    pub tls_cert_path: Option<String>,
    /// Path to TLS key file
    pub tls_key_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4433,
            max_rooms: 1000,
            metrics_port: 9090,
            max_message_size: MAX_MESSAGE_SIZE,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

/// Parse `raw` into `slot` when it is valid and `accept` agrees; warn otherwise
fn apply_var<T: FromStr>(name: &str, raw: &str, slot: &mut T, accept: impl Fn(&T) -> bool, rule: &str) {
    match raw.parse::<T>() {
        Ok(parsed) if accept(&parsed) => *slot = parsed,
        Ok(_) => tracing::warn!("{} must be {}, using default", name, rule),
        Err(_) => tracing::warn!("Invalid {} '{}', using default", name, raw),
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            apply_var("PORT", &port, &mut config.port, |p| *p > 0, "> 0");
        }

        if let Some(max_rooms) = lookup("MAX_ROOMS") {
            apply_var(
                "MAX_ROOMS",
                &max_rooms,
                &mut config.max_rooms,
                |n| *n > 0 && *n <= MAX_ROOMS_LIMIT,
                "1-100000",
            );
        }

        if let Some(port) = lookup("METRICS_PORT") {
            apply_var("METRICS_PORT", &port, &mut config.metrics_port, |p| *p > 0, "> 0");
        }

        if let Some(size) = lookup("MAX_MESSAGE_SIZE") {
            apply_var(
                "MAX_MESSAGE_SIZE",
                &size,
                &mut config.max_message_size,
                |n| *n >= MIN_MESSAGE_SIZE && *n <= u32::MAX as usize,
                "at least 1024",
            );
        }

        if let Some(cert_path) = lookup("TLS_CERT_PATH") {
            config.tls_cert_path = Some(cert_path);
        }

        if let Some(key_path) = lookup("TLS_KEY_PATH") {
            config.tls_key_path = Some(key_path);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort("port"));
        }
        if self.metrics_port == 0 {
            return Err(ConfigError::ZeroPort("metrics_port"));
        }
        if self.port == self.metrics_port {
            return Err(ConfigError::PortClash(self.port));
        }
        if self.max_rooms == 0 {
            return Err(ConfigError::NoRooms);
        }
        if self.max_message_size < MIN_MESSAGE_SIZE {
            return Err(ConfigError::FrameLimitTooSmall(self.max_message_size));
        }
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            return Err(ConfigError::PartialTls);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} cannot be 0")]
    ZeroPort(&'static str),
    #[error("metrics port {0} clashes with the relay port")]
    PortClash(u16),
    #[error("max_rooms must be at least 1")]
    NoRooms,
    #[error("max_message_size {0} is below 1024 bytes")]
    FrameLimitTooSmall(usize),
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}
