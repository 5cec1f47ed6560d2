//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POS_API_URL` - Base URL of the backend JSON API (e.g. `http://localhost:8080/api/`)
//!
//! ## Optional
//! - `POS_API_TOKEN` - Bearer token sent with every backend request
//! - `POS_API_TIMEOUT_SECS` - Per-request timeout, at least 1 (default: 10)
//! - `POS_API_MAX_ATTEMPTS` - Attempts per backend call, including the first (default: 3)
//! - `POS_API_RETRY_BACKOFF_MS` - Backoff before the first retry, doubled each retry (default: 250)
//! - `POS_STORE_NAME` - Store name printed on receipts (default: `TechShack`)
//! - `POS_LOG_FORMAT` - `text` or `json` (default: `text`)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::backend::RetryPolicy;

/// Store name printed on receipts when none is configured.
pub const DEFAULT_STORE_NAME: &str = "TechShack";

const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_MAX_ATTEMPTS: &str = "3";
const DEFAULT_RETRY_BACKOFF_MS: &str = "250";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("expected `text` or `json`, got {s:?}")),
        }
    }
}

/// Backend API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so relative paths join under it.
    pub base_url: Url,
    /// Optional bearer token.
    pub token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration for `base_url` with default timeout and retries and no token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("POS_API_URL", base_url)?,
            token: None,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url("POS_API_URL", &get_required_env("POS_API_URL")?)?;
        let token = get_optional_env("POS_API_TOKEN").map(SecretString::from);
        let timeout_secs: u64 = non_zero(
            "POS_API_TIMEOUT_SECS",
            parse_env("POS_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        )?;
        let max_attempts: u32 = non_zero(
            "POS_API_MAX_ATTEMPTS",
            parse_env("POS_API_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        )?;
        let backoff_ms: u64 = parse_env("POS_API_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)?;

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(backoff_ms)),
        })
    }
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API settings.
    pub api: ApiConfig,
    /// Store name printed on receipts.
    pub store_name: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ClientConfig {
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

        let api = ApiConfig::from_env()?;
        let store_name = get_env_or_default("POS_STORE_NAME", DEFAULT_STORE_NAME);
        let log_format = get_env_or_default("POS_LOG_FORMAT", "text")
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidEnvVar("POS_LOG_FORMAT".to_string(), e))?;

        Ok(Self {
            api,
            store_name,
            log_format,
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
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, forcing a trailing slash so `Url::join` keeps the path.
fn non_zero<T: Default + PartialEq>(key: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("POS_API_URL", "http://localhost:8080/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            url.join("users").unwrap().as_str(),
            "http://localhost:8080/api/users"
        );
    }

    #[test]
    fn test_base_url_rejects_relative() {
        let result = parse_base_url("POS_API_URL", "/api");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_zero_timeout_and_attempts_rejected() {
        assert!(matches!(
            non_zero("POS_API_TIMEOUT_SECS", 0_u64),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "POS_API_TIMEOUT_SECS"
        ));
        assert!(non_zero("POS_API_MAX_ATTEMPTS", 0_u32).is_err());
        assert_eq!(non_zero("POS_API_TIMEOUT_SECS", 10_u64).unwrap(), 10);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::new("http://127.0.0.1:9000").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let mut config = ApiConfig::new("http://127.0.0.1:9000").unwrap();
        config.token = Some(SecretString::from("tok_live_8f2a91c"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("127.0.0.1:9000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_live_8f2a91c"));
        assert_eq!(
            config.token.as_ref().unwrap().expose_secret(),
            "tok_live_8f2a91c"
        );
    }
}
