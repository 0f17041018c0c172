//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where sessions, feedback and users are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue(
                "STORAGE_BACKEND".to_string(),
                format!("'{}' is not one of postgres, memory", other),
            )),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    /// Required when `storage` is `Postgres`.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: String,
    pub auth_session_days: i64,
}

impl Default for Config {
    /// In-memory defaults used by tests and local experiments.
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            storage: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 5,
            log_level: Level::INFO,
            cors_origin: "http://localhost:3000".to_string(),
            auth_session_days: 30,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let auth_session_days: i64 = parse_var("AUTH_SESSION_DAYS", "30")?;
        if auth_session_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "AUTH_SESSION_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Load Storage Settings ---
        let storage: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }
        let db_max_connections: u32 = parse_var("DB_MAX_CONNECTIONS", "5")?;

        Ok(Self {
            bind_address,
            storage,
            database_url,
            db_max_connections,
            log_level,
            cors_origin,
            auth_session_days,
        })
    }
}
