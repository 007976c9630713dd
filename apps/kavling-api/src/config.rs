//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Kavling API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Directory holding the nine collection files.
    pub storage_dir: PathBuf,

    /// Shared admin secret. Empty means no request is ever admin.
    pub admin_token: String,

    /// HTTP listen address
    pub bind_addr: SocketAddr,

    /// Replay the payment ledger over plans and KPRs after the first load
    pub reconcile_on_start: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_dir = get("STORAGE_DIR")
            .map(|v| v.trim().to_string())
            .ok_or_else(|| ConfigError::MissingRequired("STORAGE_DIR".to_string()))?;

        let config = ApiConfig {
            storage_dir: PathBuf::from(storage_dir),

            admin_token: get("ADMIN_TOKEN").map(|v| v.trim().to_string()).unwrap_or_default(),

            bind_addr: get("BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:16000".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?,

            reconcile_on_start: match get("RECONCILE_ON_START") {
                None => true,
                Some(v) => parse_flag(&v).ok_or_else(|| ConfigError::InvalidValue("RECONCILE_ON_START".to_string()))?,
            },
        };

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
