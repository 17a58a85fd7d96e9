//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// CSV file that receives one row per submitted questionnaire.
    pub data_file: PathBuf,
    /// Optional JSON file of Argon2-hashed credentials. When unset the built-in
    /// enumerator/admin table is used.
    pub credentials_path: Option<PathBuf>,
    pub session_ttl_hours: i64,
    pub cors_origin: String,
    pub secure_cookies: bool,
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
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Storage and Auth Settings ---
        let data_file = std::env::var("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("paid_questionnaire_new_data.csv"));

        let credentials_path = std::env::var("CREDENTIALS_PATH").ok().map(PathBuf::from);

        let ttl_str = std::env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "12".to_string());
        let session_ttl_hours = match ttl_str.parse::<i64>() {
            Ok(hours) if hours > 0 => hours,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_TTL_HOURS".to_string(),
                    format!("'{}' is not a positive number of hours", ttl_str),
                ))
            }
        };

        let secure_str = std::env::var("SECURE_COOKIES").unwrap_or_else(|_| "true".to_string());
        let secure_cookies = secure_str.parse::<bool>().map_err(|_| {
            ConfigError::InvalidValue(
                "SECURE_COOKIES".to_string(),
                format!("'{}' is not true or false", secure_str),
            )
        })?;

        Ok(Self {
            bind_address,
            log_level,
            data_file,
            credentials_path,
            session_ttl_hours,
            cors_origin,
            secure_cookies,
        })
    }

    /// A configuration for a local instance writing to `data_file`, with all
    /// other settings at their defaults.
    pub fn local(data_file: impl Into<PathBuf>) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: Level::INFO,
            data_file: data_file.into(),
            credentials_path: None,
            session_ttl_hours: 12,
            cors_origin: "http://localhost:3000".to_string(),
            secure_cookies: false,
        }
    }
}
