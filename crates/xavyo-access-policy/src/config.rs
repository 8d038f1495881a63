//! Policy API client configuration parsed from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{PolicyError, PolicyResult};
use crate::models::DEFAULT_PARTITION_KEY;
use crate::retry::RetryPolicy;

/// Connection settings for the policy API.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the platform API, without a trailing slash.
    pub base_url: String,
    /// Static bearer token.
    pub api_token: String,
    /// Per-request timeout (default: 30s).
    pub request_timeout: Duration,
    /// Whether to verify TLS certificates (default: true).
    pub tls_verify: bool,
    /// Retry settings applied around every remote call.
    pub retry: RetryPolicy,
    /// Partition new instance targets are written to.
    pub partition_key: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("tls_verify", &self.tls_verify)
            .field("retry", &self.retry)
            .field("partition_key", &self.partition_key)
            .finish()
    }
}

impl ClientConfig {
    /// Config with defaults for everything but the endpoint and token.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            request_timeout: Duration::from_secs(30),
            tls_verify: true,
            retry: RetryPolicy::default(),
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
        }
    }

    /// Parse configuration from environment variables.
    ///
    /// Reads:
    /// - `ACCESS_POLICY_API_URL` (required)
    /// - `ACCESS_POLICY_API_TOKEN` (required)
    /// - `ACCESS_POLICY_REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `ACCESS_POLICY_TLS_VERIFY` (default: true)
    /// - `ACCESS_POLICY_MAX_RETRIES` (default: 5)
    /// - `ACCESS_POLICY_RETRY_BASE_DELAY_MS` (default: 1000)
    /// - `ACCESS_POLICY_RETRY_MAX_DELAY_MS` (default: 60000)
    /// - `ACCESS_POLICY_PARTITION_KEY` (default: `FQDN/IP`)
    pub fn from_env() -> PolicyResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> PolicyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = non_empty("ACCESS_POLICY_API_URL").ok_or_else(|| {
            PolicyError::InvalidConfig("ACCESS_POLICY_API_URL is not set".to_string())
        })?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(PolicyError::InvalidConfig(format!(
                "ACCESS_POLICY_API_URL must be an http(s) URL, got '{base_url}'"
            )));
        }

        let api_token = non_empty("ACCESS_POLICY_API_TOKEN").ok_or_else(|| {
            PolicyError::InvalidConfig("ACCESS_POLICY_API_TOKEN is not set".to_string())
        })?;

        let number = |key: &str, default: u64| {
            non_empty(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let tls_verify = non_empty("ACCESS_POLICY_TLS_VERIFY")
            .map_or(true, |s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no"));

        let max_retries = u32::try_from(number("ACCESS_POLICY_MAX_RETRIES", 5)).unwrap_or(5);

        let mut config = Self::new(base_url, api_token);
        config.request_timeout =
            Duration::from_secs(number("ACCESS_POLICY_REQUEST_TIMEOUT_SECS", 30));
        config.tls_verify = tls_verify;
        config.retry = RetryPolicy::new(
            max_retries,
            Duration::from_millis(number("ACCESS_POLICY_RETRY_BASE_DELAY_MS", 1000)),
        )
        .with_max_delay(Duration::from_millis(number(
            "ACCESS_POLICY_RETRY_MAX_DELAY_MS",
            60_000,
        )));
        if let Some(partition_key) = non_empty("ACCESS_POLICY_PARTITION_KEY") {
            config.partition_key = partition_key;
        }

        Ok(config)
    }
}
