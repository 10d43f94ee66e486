//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address to bind (default: 0.0.0.0:8080)
    pub bind_addr: String,

    /// SQLite database file path
    pub database_path: String,

    /// Maximum pooled database connections
    pub db_max_connections: u32,

    /// JWT secret key for verifying tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// ISO currency code sent to the payment gateway
    pub payment_currency: String,

    /// Gateway key secret. When unset the gateway runs in mock mode and
    /// only the payment id is checked.
    pub payment_key_secret: Option<String>,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Allowed CORS origin for the admin console (optional)
    pub cors_allow_origin: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./bites.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: jwt_secret_or_random(env::var("JWT_SECRET").ok()),

            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", "3600")?,

            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),

            payment_key_secret: env::var("PAYMENT_KEY_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            log_format: match env::var("LOG_FORMAT").as_deref() {
                Err(_) | Ok("pretty") => LogFormat::Pretty,
                Ok("json") => LogFormat::Json,
                Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
            },

            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok(),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Configuration for tests: in-memory database, fixed secrets, mock gateway.
    pub fn for_tests() -> Self {
        ApiConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_path: ":memory:".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            payment_currency: "INR".to_string(),
            payment_key_secret: None,
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            cors_allow_origin: None,
        }
    }
}

/// Uses the configured secret, or a fresh random one when unset or blank.
/// Tokens then only verify within this process.
fn jwt_secret_or_random(configured: Option<String>) -> String {
    match configured.filter(|s| !s.trim().is_empty()) {
        Some(secret) => secret,
        None => {
            warn!("JWT_SECRET is not set; using a random per-process secret");
            format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_jwt_secret_is_kept() {
        assert_eq!(jwt_secret_or_random(Some("s3cret".to_string())), "s3cret");
    }

    #[test]
    fn test_missing_jwt_secret_is_random() {
        let first = jwt_secret_or_random(None);
        let second = jwt_secret_or_random(Some("   ".to_string()));

        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }
}
