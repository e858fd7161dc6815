// ABOUTME: Configuration loading and validation for the logbook server.
// ABOUTME: Reads LOGBOOK_* environment variables and rejects values that cannot be used.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use logbook_core::Location;
use logbook_core::timezone::DEFAULT_ZONE;
use logbook_store::PoolConfig;
use thiserror::Error;

use crate::app_state::DEFAULT_MAX_BODY_BYTES;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LOGBOOK_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("LOGBOOK_POOL_SIZE must be a whole number of at least 1: {0}")]
    InvalidPoolSize(String),

    #[error("LOGBOOK_CONNECT_TIMEOUT_SECS must be a whole number of seconds: {0}")]
    InvalidConnectTimeout(String),

    #[error("LOGBOOK_MAX_BODY_BYTES must be a whole number of at least 1: {0}")]
    InvalidMaxBodyBytes(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LogbookConfig {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub timezone: String,
    pub pool_size: usize,
    pub connect_timeout: Duration,
    pub max_body_bytes: usize,
}

impl LogbookConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - LOGBOOK_DB: SQLite database path (default: ./logbook.db)
    /// - LOGBOOK_BIND: socket address to bind (default: 127.0.0.1:8080)
    /// - LOGBOOK_TIMEZONE: zone for parsing and display (default: Europe/Berlin)
    /// - LOGBOOK_POOL_SIZE: max database connections (default: 4)
    /// - LOGBOOK_CONNECT_TIMEOUT_SECS: wait for a connection (default: 5)
    /// - LOGBOOK_MAX_BODY_BYTES: largest journal upload (default: 256 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("LOGBOOK_DB")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./logbook.db"));

        let bind_str =
            std::env::var("LOGBOOK_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind = parse_bind(&bind_str)?;

        let timezone = std::env::var("LOGBOOK_TIMEZONE")
            .ok()
            .filter(|z| !z.is_empty())
            .unwrap_or_else(|| DEFAULT_ZONE.to_string());

        let pool_size = match std::env::var("LOGBOOK_POOL_SIZE") {
            Ok(v) => parse_pool_size(&v)?,
            Err(_) => PoolConfig::default().max_size,
        };

        let connect_timeout = match std::env::var("LOGBOOK_CONNECT_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidConnectTimeout(v))?,
            Err(_) => PoolConfig::default().connect_timeout,
        };

        let max_body_bytes = match std::env::var("LOGBOOK_MAX_BODY_BYTES") {
            Ok(v) => match v.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(ConfigError::InvalidMaxBodyBytes(v)),
            },
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            db_path,
            bind,
            timezone,
            pool_size,
            connect_timeout,
            max_body_bytes,
        })
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_size: self.pool_size,
            connect_timeout: self.connect_timeout,
        }
    }

    /// Resolve the configured zone, falling back to local time if unknown.
    pub fn location(&self) -> Location {
        Location::resolve(&self.timezone)
    }
}

pub fn parse_bind(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidBind(value.to_string()))
}

pub fn parse_pool_size(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::InvalidPoolSize(value.to_string())),
    }
}
