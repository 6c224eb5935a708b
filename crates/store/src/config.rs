//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTWHEEL_STOCK_BASE_URL` - Base URL of the stock service
//!   (e.g., `http://localhost:3333`)
//!
//! ## Optional
//! - `CARTWHEEL_STOCK_TIMEOUT_SECS` - Stock request timeout (default: 10)
//! - `CARTWHEEL_STORAGE_PATH` - Cart persistence file
//!   (default: cartwheel-cart.json)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Stock service configuration.
    pub stock: StockServiceConfig,
    /// Path of the JSON file the cart is persisted to.
    pub storage_path: PathBuf,
}

/// Stock service endpoint configuration.
#[derive(Debug, Clone)]
pub struct StockServiceConfig {
    /// Base URL of the stock service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let stock = StockServiceConfig::from_env()?;
        let storage_path =
            PathBuf::from(get_env_or_default("CARTWHEEL_STORAGE_PATH", "cartwheel-cart.json"));

        Ok(Self {
            stock,
            storage_path,
        })
    }
}

impl StockServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("CARTWHEEL_STOCK_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = get_env_or_default("CARTWHEEL_STOCK_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CARTWHEEL_STOCK_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_env() {
        let result = get_required_env("CARTWHEEL_TEST_DOES_NOT_EXIST");
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_env_or_default_falls_back() {
        let value = get_env_or_default("CARTWHEEL_TEST_DOES_NOT_EXIST", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("CARTWHEEL_STOCK_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: CARTWHEEL_STOCK_BASE_URL"
        );
    }
}
