//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The loaded config is constructed once at startup and passed
//! explicitly to whoever needs it - no global settings singleton.

use std::env;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,

    /// Upper bound for a single order/stock transaction, in seconds.
    /// A transaction hitting this bound is rolled back and reported as
    /// retryable.
    pub transaction_timeout_secs: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "emporia.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback; in production this MUST be set
                "emporia-dev-secret-change-in-production".to_string()
            }),

            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ACCESS_TOKEN_EXPIRE_MINUTES".to_string()))?,

            transaction_timeout_secs: env::var("TRANSACTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TRANSACTION_TIMEOUT_SECS".to_string()))?,
        };

        Ok(config)
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }

    /// Access token lifetime in seconds.
    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.access_token_expire_minutes * 60
    }

    /// Transaction timeout as a Duration.
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8000,
            database_path: "emporia.db".to_string(),
            jwt_secret: "emporia-dev-secret-change-in-production".to_string(),
            access_token_expire_minutes: 30,
            transaction_timeout_secs: 30,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
