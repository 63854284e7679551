//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Payment gateway API key
//! - `STRIPE_WEBHOOK_SECRET` - Webhook endpoint signing secret
//! - `PRINT_API_TOKEN` - Fulfillment supplier API token
//! - `PRINT_SHOP_ID` - Fulfillment supplier shop id (integer)
//!
//! ## Optional
//! - `CHECKOUT_DATABASE_URL` - SQLite URL (default: sqlite:driftpress.db)
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Site API port (default: 4242)
//! - `CHECKOUT_WEBHOOK_PORT` - Webhook listener port (default: 4343)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout application configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// SQLite database URL
    pub database_url: String,
    /// IP address to bind both listeners to
    pub host: IpAddr,
    /// Site API port (CSRF-protected)
    pub port: u16,
    /// Webhook listener port (signature-verified, no CSRF)
    pub webhook_port: u16,
    /// Payment gateway configuration
    pub stripe: StripeConfig,
    /// Fulfillment supplier configuration
    pub fulfillment: FulfillmentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API secret key
    pub secret_key: SecretString,
    /// Webhook endpoint signing secret
    pub webhook_secret: SecretString,
}

/// Fulfillment supplier configuration.
#[derive(Debug, Clone)]
pub struct FulfillmentConfig {
    /// Supplier API bearer token
    pub api_token: SecretString,
    /// Supplier shop id
    pub shop_id: i64,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, length check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_env_or_default("CHECKOUT_DATABASE_URL", "sqlite:driftpress.db");
        let host = get_env_or_default("CHECKOUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_HOST".to_owned(), e.to_string()))?;
        let port = parse_port("CHECKOUT_PORT", "4242")?;
        let webhook_port = parse_port("CHECKOUT_WEBHOOK_PORT", "4343")?;

        let stripe = StripeConfig::from_env()?;
        let fulfillment = FulfillmentConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            webhook_port,
            stripe,
            fulfillment,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for the site API listener.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the socket address for the webhook listener.
    #[must_use]
    pub const fn webhook_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.webhook_port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
        })
    }
}

impl FulfillmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let shop_id = get_required_env("PRINT_SHOP_ID")?
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar("PRINT_SHOP_ID".to_owned(), e.to_string()))?;

        Ok(Self {
            api_token: get_validated_secret("PRINT_API_TOKEN")?,
            shop_id,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse a port variable with a default.
fn parse_port(key: &str, default: &str) -> Result<u16, ConfigError> {
    get_env_or_default(key, default)
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Validate that a secret is not an obvious placeholder and has a plausible
/// length for an API credential.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {MIN_SECRET_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-goes-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_too_short() {
        let result = validate_secret_strength("sk_short", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("whsec_8fb2a1c9d4e7f0a3b6c9", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addrs() {
        let config = CheckoutConfig {
            database_url: "sqlite::memory:".to_owned(),
            host: "127.0.0.1".parse().unwrap(),
            port: 4242,
            webhook_port: 4343,
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
                webhook_secret: SecretString::from("whsec_8fb2a1c9d4e7f0a3b6c9"),
            },
            fulfillment: FulfillmentConfig {
                api_token: SecretString::from("pfy_1a2b3c4d5e6f7a8b9c0d"),
                shop_id: 1,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        assert_eq!(config.socket_addr().port(), 4242);
        assert_eq!(config.webhook_socket_addr().port(), 4343);
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let config = StripeConfig {
            secret_key: SecretString::from("sk_live_very_secret_value"),
            webhook_secret: SecretString::from("whsec_also_very_secret"),
        };

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sk_live_very_secret_value"));
        assert!(!debug_output.contains("whsec_also_very_secret"));
    }
}
