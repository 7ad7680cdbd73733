//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STOREFRONT_MAILBOX_CAPACITY` - Actor channel capacity (default: 32)
//! - `STOREFRONT_STORE_CALL_TIMEOUT_MS` - Timeout for each store call (default: 2000)
//! - `STOREFRONT_STORE_RETRY_ATTEMPTS` - Attempts for retryable store calls (default: 3)
//! - `STOREFRONT_RETRY_BACKOFF_MS` - Linear backoff step between attempts (default: 25)
//! - `STOREFRONT_RESERVATION_MAX_ATTEMPTS` - Compare-and-set attempts per reserved line (default: 8)
//! - `STOREFRONT_CHECKOUT_LEASE_TTL_SECS` - Lifetime of a per-user checkout lease (default: 30)

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Runtime knobs for the actors, the clients and the checkout coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Capacity of each actor's mailbox
    pub mailbox_capacity: usize,
    /// Upper bound for one store call; past it the outcome is unknown
    pub store_call_timeout: Duration,
    /// Attempts for a store call that failed transiently
    pub store_retry_attempts: u32,
    /// Step of the linear backoff between attempts
    pub retry_backoff: Duration,
    /// Compare-and-set attempts when reserving or releasing one line
    pub reservation_max_attempts: u32,
    pub checkout_lease_ttl: Duration,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            store_call_timeout: Duration::from_millis(2000),
            store_retry_attempts: 3,
            retry_backoff: Duration::from_millis(25),
            reservation_max_attempts: 8,
            checkout_lease_ttl: Duration::from_secs(30),
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
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mailbox_capacity: usize = parse_or(
            &lookup,
            "STOREFRONT_MAILBOX_CAPACITY",
            defaults.mailbox_capacity,
        )?;
        if mailbox_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_MAILBOX_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            mailbox_capacity,
            store_call_timeout: Duration::from_millis(parse_or(
                &lookup,
                "STOREFRONT_STORE_CALL_TIMEOUT_MS",
                2000,
            )?),
            store_retry_attempts: parse_or(
                &lookup,
                "STOREFRONT_STORE_RETRY_ATTEMPTS",
                defaults.store_retry_attempts,
            )?,
            retry_backoff: Duration::from_millis(parse_or(
                &lookup,
                "STOREFRONT_RETRY_BACKOFF_MS",
                25,
            )?),
            reservation_max_attempts: parse_or(
                &lookup,
                "STOREFRONT_RESERVATION_MAX_ATTEMPTS",
                defaults.reservation_max_attempts,
            )?,
            checkout_lease_ttl: Duration::from_secs(parse_or(
                &lookup,
                "STOREFRONT_CHECKOUT_LEASE_TTL_SECS",
                30,
            )?),
        })
    }

    /// Lease lifetime as a wall-clock span.
    pub fn lease_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.checkout_lease_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(30))
    }
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StorefrontConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_STORE_CALL_TIMEOUT_MS", "150"),
            ("STOREFRONT_RESERVATION_MAX_ATTEMPTS", " 3 "),
            ("STOREFRONT_CHECKOUT_LEASE_TTL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.store_call_timeout, Duration::from_millis(150));
        assert_eq!(config.reservation_max_attempts, 3);
        assert_eq!(config.lease_ttl(), chrono::Duration::seconds(5));
        assert_eq!(config.mailbox_capacity, 32);
    }

    #[test]
    fn test_invalid_values() {
        let err = StorefrontConfig::from_vars(vars(&[("STOREFRONT_RETRY_BACKOFF_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "STOREFRONT_RETRY_BACKOFF_MS"));

        let err = StorefrontConfig::from_vars(vars(&[("STOREFRONT_MAILBOX_CAPACITY", "0")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnvVar(
                "STOREFRONT_MAILBOX_CAPACITY".to_string(),
                "must be at least 1".to_string()
            )
        );
    }
}
