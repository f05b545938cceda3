//! Webhook verifier configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults. `from_vars` exists so tests can build configurations without
//! touching the process environment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Key-set caching policy.
///
/// Caching is explicit configuration rather than implicit behavior, so
/// tests can assert either policy deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Fetch the key set fresh on every verification call.
    #[default]
    AlwaysFetch,

    /// Keep a fetched key set until the TTL expires, then refetch.
    Ttl(Duration),
}

/// Webhook verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// URL of the issuer's JWKS endpoint. HTTPS in production.
    pub jwks_url: String,

    /// Bound on the key-set fetch. A slow or unresponsive issuer endpoint
    /// must not block the caller indefinitely.
    pub fetch_timeout: Duration,

    /// Key-set caching policy.
    pub cache: CachePolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid fetch timeout configuration: {0}")]
    InvalidFetchTimeout(String),

    #[error("Invalid cache TTL configuration: {0}")]
    InvalidCacheTtl(String),
}

impl VerifierConfig {
    /// Create a configuration for the given JWKS endpoint with the default
    /// fetch timeout and no caching.
    #[must_use]
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
            cache: CachePolicy::AlwaysFetch,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `WEBHOOK_JWKS_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// Recognized variables:
    /// - `WEBHOOK_JWKS_URL` (required)
    /// - `WEBHOOK_JWKS_TIMEOUT_SECONDS` (default: 10, must be positive)
    /// - `WEBHOOK_JWKS_CACHE_TTL_SECONDS` (absent or 0: always refetch)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing URL, a non-numeric or zero
    /// timeout, or a non-numeric cache TTL.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_url = vars
            .get("WEBHOOK_JWKS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("WEBHOOK_JWKS_URL".to_string()))?
            .clone();

        let fetch_timeout = match vars.get("WEBHOOK_JWKS_TIMEOUT_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidFetchTimeout(format!("not a number: {raw}"))
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidFetchTimeout(
                        "timeout must be positive".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        };

        let cache = match vars.get("WEBHOOK_JWKS_CACHE_TTL_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidCacheTtl(format!("not a number: {raw}")))?;
                if secs == 0 {
                    CachePolicy::AlwaysFetch
                } else {
                    CachePolicy::Ttl(Duration::from_secs(secs))
                }
            }
            None => CachePolicy::AlwaysFetch,
        };

        Ok(Self {
            jwks_url,
            fetch_timeout,
            cache,
        })
    }
}
