//! Configuration loading from disk and environment.
//!
//! The deployment is environment-driven: a TOML file is optional (pointed at
//! by `GATEWAY_CONFIG`), and individual environment variables override
//! whatever the file or the defaults supplied.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },

    #[error("invalid base address for {service}: {addr}")]
    InvalidBaseAddress { service: String, addr: String },

    #[error("{0} must be at least 1")]
    ZeroThreshold(&'static str),
}

/// Load and validate configuration from a TOML file.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Build the effective configuration: defaults, then the optional TOML file
/// named by `GATEWAY_CONFIG`, then environment variable overrides.
pub fn load() -> Result<GatewayConfig, ConfigError> {
    let mut config = match env::var("GATEWAY_CONFIG") {
        Ok(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        Err(_) => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    if let Ok(v) = env::var("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Ok(v) = env::var("PRODUCTOS_URL") {
        config.services.productos = v;
    }
    if let Ok(v) = env::var("RECETAS_URL") {
        config.services.recetas = v;
    }
    if let Ok(v) = env::var("LISTAS_URL") {
        config.services.listas = v;
    }
    if let Some(v) = parse_env("RETRY_MAX_ATTEMPTS")? {
        config.retries.max_attempts = v;
    }
    if let Some(v) = parse_env("RETRY_BASE_DELAY_MS")? {
        config.retries.base_delay_ms = v;
    }
    if let Some(v) = parse_env("BREAKER_FAILURE_THRESHOLD")? {
        config.breaker.failure_threshold = v;
    }
    if let Some(v) = parse_env("BREAKER_COOLDOWN_SECS")? {
        config.breaker.cooldown_secs = v;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Semantic validation; serde handles the syntactic side.
pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    for (service, addr) in [
        ("productos", &config.services.productos),
        ("recetas", &config.services.recetas),
        ("listas", &config.services.listas),
    ] {
        let parsed = Url::parse(addr).map_err(|_| ConfigError::InvalidBaseAddress {
            service: service.to_string(),
            addr: addr.clone(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidBaseAddress {
                service: service.to_string(),
                addr: addr.clone(),
            });
        }
    }

    if config.retries.max_attempts == 0 {
        return Err(ConfigError::ZeroThreshold("retries.max_attempts"));
    }
    if config.breaker.failure_threshold == 0 {
        return Err(ConfigError::ZeroThreshold("breaker.failure_threshold"));
    }
    Ok(())
}
