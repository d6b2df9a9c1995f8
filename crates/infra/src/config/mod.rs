//! Connector configuration
//!
//! Configuration comes from defaults that match the partner's published
//! limits, with environment variable overrides for staging and tests.
//!
//! ## Environment Variables
//! - `IFOOD_BASE_URL`: API base URL
//! - `IFOOD_AUTH_URL`: OAuth token endpoint
//! - `IFOOD_MAX_REQUESTS_PER_MINUTE`: rate limit window capacity
//! - `IFOOD_DEDUP_CAPACITY`: bounded size of the dedup registry
//! - `IFOOD_ACK_RETRY_BACKOFF_MS`: delay before the acknowledgment retry
//! - `IFOOD_STATUS_CACHE_TTL_SECS`: merchant status cache TTL
//! - `IFOOD_AVAILABILITY_CACHE_TTL_SECS`: availability cache TTL
//! - `IFOOD_SECRET_NAME`: secret bundle name for the credentials
//!
//! Credentials themselves never live in config; they come from a
//! [`SecretsProvider`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use prato_core::SecretsProvider;
use prato_domain::constants::{
    ACK_RETRY_BACKOFF, AVAILABILITY_CACHE_TTL, DEFAULT_DEDUP_CAPACITY, IFOOD_AUTH_PATH,
    IFOOD_BASE_URL, MAX_REQUESTS_PER_MINUTE, STATUS_CACHE_TTL,
};
use prato_domain::{PratoError, Result};
use tracing::info;
use url::Url;

/// iFood connector configuration
#[derive(Debug, Clone)]
pub struct IfoodConfig {
    pub base_url: String,
    pub auth_url: String,
    pub max_requests_per_minute: usize,
    pub dedup_capacity: usize,
    pub ack_retry_backoff: Duration,
    pub status_cache_ttl: Duration,
    pub availability_cache_ttl: Duration,
    pub secret_name: String,
    pub user_agent: String,
}

impl Default for IfoodConfig {
    fn default() -> Self {
        Self {
            base_url: IFOOD_BASE_URL.to_string(),
            auth_url: format!("{IFOOD_BASE_URL}{IFOOD_AUTH_PATH}"),
            max_requests_per_minute: MAX_REQUESTS_PER_MINUTE,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            ack_retry_backoff: ACK_RETRY_BACKOFF,
            status_cache_ttl: STATUS_CACHE_TTL,
            availability_cache_ttl: AVAILABILITY_CACHE_TTL,
            secret_name: "prato/ifood-credentials".to_string(),
            user_agent: "Prato-Ifood-Connector/1.0".to_string(),
        }
    }
}

impl IfoodConfig {
    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("IFOOD_BASE_URL") {
            config.auth_url = format!("{base}{IFOOD_AUTH_PATH}");
            config.base_url = base;
        }
        if let Ok(auth) = std::env::var("IFOOD_AUTH_URL") {
            config.auth_url = auth;
        }
        if let Ok(raw) = std::env::var("IFOOD_MAX_REQUESTS_PER_MINUTE") {
            config.max_requests_per_minute = parse_env("IFOOD_MAX_REQUESTS_PER_MINUTE", &raw)?;
        }
        if let Ok(raw) = std::env::var("IFOOD_DEDUP_CAPACITY") {
            config.dedup_capacity = parse_env("IFOOD_DEDUP_CAPACITY", &raw)?;
        }
        if let Ok(raw) = std::env::var("IFOOD_ACK_RETRY_BACKOFF_MS") {
            config.ack_retry_backoff =
                Duration::from_millis(parse_env("IFOOD_ACK_RETRY_BACKOFF_MS", &raw)?);
        }
        if let Ok(raw) = std::env::var("IFOOD_STATUS_CACHE_TTL_SECS") {
            config.status_cache_ttl =
                Duration::from_secs(parse_env("IFOOD_STATUS_CACHE_TTL_SECS", &raw)?);
        }
        if let Ok(raw) = std::env::var("IFOOD_AVAILABILITY_CACHE_TTL_SECS") {
            config.availability_cache_ttl =
                Duration::from_secs(parse_env("IFOOD_AVAILABILITY_CACHE_TTL_SECS", &raw)?);
        }
        if let Ok(name) = std::env::var("IFOOD_SECRET_NAME") {
            config.secret_name = name;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| PratoError::Config(format!("invalid base_url: {e}")))?;
        Url::parse(&self.auth_url)
            .map_err(|e| PratoError::Config(format!("invalid auth_url: {e}")))?;
        if self.max_requests_per_minute == 0 {
            return Err(PratoError::Config(
                "max_requests_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.dedup_capacity == 0 {
            return Err(PratoError::Config("dedup_capacity must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Log the effective configuration at startup. Secrets are not part
    /// of the config, so everything here is safe to log.
    pub fn log_config(&self) {
        info!(
            base_url = %self.base_url,
            max_requests_per_minute = self.max_requests_per_minute,
            dedup_capacity = self.dedup_capacity,
            status_cache_ttl_secs = self.status_cache_ttl.as_secs(),
            availability_cache_ttl_secs = self.availability_cache_ttl.as_secs(),
            "ifood connector configuration"
        );
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| PratoError::Config(format!("invalid {name}: {e}")))
}

/// Secrets provider backed by process environment variables.
///
/// Looks up `<PREFIX>_CLIENT_ID`, `<PREFIX>_CLIENT_SECRET`,
/// `<PREFIX>_MERCHANT_ID` and `<PREFIX>_WEBHOOK_SECRET` regardless of
/// the requested bundle name. Suited to local development; production
/// deployments plug in a vault-backed provider instead.
#[derive(Debug, Clone)]
pub struct EnvSecretsProvider {
    prefix: String,
}

impl EnvSecretsProvider {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string() }
    }
}

impl Default for EnvSecretsProvider {
    fn default() -> Self {
        Self::new("IFOOD")
    }
}

#[async_trait]
impl SecretsProvider for EnvSecretsProvider {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>> {
        let mut bundle = HashMap::new();
        for key in ["client_id", "client_secret", "merchant_id", "webhook_secret"] {
            let var = format!("{}_{}", self.prefix, key.to_uppercase());
            let value = std::env::var(&var).map_err(|_| {
                PratoError::Config(format!("missing environment variable {var} for secret {name}"))
            })?;
            bundle.insert(key.to_string(), value);
        }
        Ok(bundle)
    }
}
