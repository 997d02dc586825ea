use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::http::ApiEndpoint;

pub const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 3.0;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: usize = 3;
pub const MAX_RETRIES_LIMIT: usize = 10;

pub const ENV_MAX_RPS: &str = "BIOTOOLS_MAX_RPS";
pub const ENV_TIMEOUT: &str = "BIOTOOLS_HTTP_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "BIOTOOLS_MAX_RETRIES";
pub const ENV_NCBI_API_KEY: &str = "NCBI_API_KEY";

/// Ceiling and window span for one limiter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub max_requests_per_second: f64,
    #[serde(default = "default_window")]
    pub window: Duration,
}

fn default_window() -> Duration {
    DEFAULT_WINDOW
}

impl LimiterConfig {
    pub fn new(max_requests_per_second: f64) -> Result<Self, ConfigError> {
        let config = Self {
            max_requests_per_second,
            window: DEFAULT_WINDOW,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.max_requests_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        if self.window.is_zero() {
            return Err(ConfigError::InvalidWindow);
        }
        Ok(())
    }

    /// Ceiling for `endpoint`, honouring `BIOTOOLS_MAX_RPS` and `NCBI_API_KEY`
    pub fn for_endpoint(endpoint: ApiEndpoint) -> Result<Self, ConfigError> {
        Self::for_endpoint_with(endpoint, env_lookup)
    }

    pub(crate) fn for_endpoint_with<F>(endpoint: ApiEndpoint, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let has_key = lookup(ENV_NCBI_API_KEY).is_some_and(|k| !k.trim().is_empty());
        let rate = match parse_var::<f64, _>(&lookup, ENV_MAX_RPS)? {
            Some(rate) => rate,
            None => endpoint.default_rate(has_key),
        };
        Self::new(rate)
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Settings for `RateLimitedClient`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub user_agent: String,
    #[serde(default)]
    pub ncbi_api_key: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_TIMEOUT)? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<usize, _>(&lookup, ENV_MAX_RETRIES)? {
            config.max_retries = retries;
        }
        config.ncbi_api_key = lookup(ENV_NCBI_API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Attempts per request must be in `1..=MAX_RETRIES_LIMIT`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 || self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::InvalidRetries(self.max_retries));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: format!("biotools-core/{}", env!("CARGO_PKG_VERSION")),
            ncbi_api_key: None,
        }
    }
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };

    match raw.trim().parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(ConfigError::InvalidEnv { var, value: raw }),
    }
}
