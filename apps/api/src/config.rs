//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, and validated once at startup.

use serde::{Deserialize, Serialize};
use std::env;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file path
    pub database_path: String,

    /// Fixed latency of the simulated payment gateway, in milliseconds
    pub payment_latency_ms: u64,

    /// When true the simulated gateway declines every charge; used to
    /// exercise the storefront's retry path in development
    pub payment_decline_all: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./libreria.db".to_string()),

            payment_latency_ms: env::var("PAYMENT_LATENCY_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYMENT_LATENCY_MS".to_string()))?,

            payment_decline_all: env::var("PAYMENT_DECLINE_ALL")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        };

        Ok(config)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 8080,
            database_path: "./libreria.db".to_string(),
            payment_latency_ms: 1500,
            payment_decline_all: false,
        }
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
