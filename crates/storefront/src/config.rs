//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL of this client (payment return page lives under it)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `HFC_API_BASE_URL` - Restaurant backend REST base (default: <http://127.0.0.1:8000/api/v1>)
//! - `HFC_HTTP_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `HFC_STATUS_CHECK_DELAY_MS` - Pause before the first payment status check (default: 3000)
//! - `HFC_STATUS_POLL_ATTEMPTS` - Status checks while the payment is pending (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Restaurant backend API configuration
    pub backend: BackendConfig,
    /// Payment status page pacing
    pub payment_status: PaymentStatusConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Restaurant backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL including the API version prefix, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Pacing of the payment status check after the gateway returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStatusConfig {
    /// Wait before the first check, so the gateway's own redirect settles.
    pub initial_delay: Duration,
    /// Maximum number of checks while the payment reports pending (>= 1).
    pub max_attempts: u32,
    /// Base backoff between pending re-checks; doubles per attempt.
    pub backoff: Duration,
}

impl Default for PaymentStatusConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            max_attempts: 1,
            backoff: Duration::from_secs(2),
        }
    }
}

impl StorefrontConfig {
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

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = trim_trailing_slash(get_required_env("STOREFRONT_BASE_URL")?);

        let backend = BackendConfig::from_env()?;
        let payment_status = PaymentStatusConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            payment_status,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL the payment gateway should send the customer back to.
    #[must_use]
    pub fn payment_return_url(&self) -> String {
        format!("{}/payment-status", self.base_url)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            trim_trailing_slash(get_env_or_default("HFC_API_BASE_URL", DEFAULT_API_BASE_URL));
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("HFC_API_BASE_URL".to_string(), e.to_string())
        })?;
        let timeout_secs: u64 = parse_env("HFC_HTTP_TIMEOUT_SECS", "15")?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl PaymentStatusConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms: u64 = parse_env("HFC_STATUS_CHECK_DELAY_MS", "3000")?;
        let max_attempts: u32 = parse_env("HFC_STATUS_POLL_ATTEMPTS", "1")?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HFC_STATUS_POLL_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            initial_delay: Duration::from_millis(delay_ms),
            max_attempts,
            ..Self::default()
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                timeout: Duration::from_secs(15),
            },
            payment_status: PaymentStatusConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_payment_return_url() {
        assert_eq!(
            config().payment_return_url(),
            "http://localhost:3000/payment-status"
        );
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://order.example.in".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(
            trim_trailing_slash("http://api/v1//".to_string()),
            "http://api/v1"
        );
    }

    #[test]
    fn test_parse_value_reports_key() {
        let result = parse_value::<u16>("STOREFRONT_PORT", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"));
        assert_eq!(parse_value::<u32>("X", " 4 ").unwrap(), 4);
    }
}
