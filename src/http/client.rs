use reqwest::blocking::Client;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::endpoint::ApiEndpoint;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rate_limiter::{registry, RateLimiter};

const MAX_URL_LENGTH: usize = 2000;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Blocking HTTP client for one API. Every attempt, retries included,
/// passes through the endpoint's rate limiter first.
pub struct RateLimitedClient {
    client: Client,
    endpoint: ApiEndpoint,
    limiter: Arc<RateLimiter>,
    max_retries: usize,
    api_key: Option<String>,
}

impl RateLimitedClient {
    /// Client using the process-wide limiter for `endpoint`
    pub fn new(endpoint: ApiEndpoint, config: ClientConfig) -> Result<Self, ClientError> {
        let limiter = registry::shared(endpoint)?;
        Self::with_limiter(endpoint, config, limiter)
    }

    pub fn with_limiter(
        endpoint: ApiEndpoint,
        config: ClientConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            limiter,
            max_retries: config.max_retries,
            api_key: config.ncbi_api_key,
        })
    }

    pub fn endpoint(&self) -> ApiEndpoint {
        self.endpoint
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Resolve `path` against the endpoint base URL; absolute URLs pass through
    pub fn url(&self, path: &str) -> Result<String, ClientError> {
        if path.trim().is_empty() || path.len() > MAX_URL_LENGTH {
            return Err(ClientError::InvalidUrl(path.to_string()));
        }

        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }

        Ok(format!(
            "{}/{}",
            self.endpoint.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    pub fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ClientError> {
        let url = self.url(path)?;
        let mut attempt = 1;

        loop {
            match self.get_once(&url, query) {
                Ok(body) => {
                    tracing::info!("Fetched {} ({} bytes, attempt {})", url, body.len(), attempt);
                    return Ok(body);
                }
                Err(e) if !e.is_retryable() || attempt >= self.max_retries => {
                    tracing::warn!("{} request to {} failed for good: {}", self.endpoint, url, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        self.endpoint,
                        attempt,
                        self.max_retries,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    pub fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ClientError> {
        let body = self.get_text(path, query)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ClientError> {
        self.limiter.wait_if_needed();

        let mut request = self.client.get(url).query(query);
        if self.endpoint.is_ncbi() {
            if let Some(key) = &self.api_key {
                request = request.query(&[("api_key", key.as_str())]);
            }
        }

        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(response.text()?)
    }
}

/// Delay after failed attempt `attempt` (1-based): 1s, doubling, capped
fn backoff_delay(attempt: usize) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    Duration::from_secs(2u64.saturating_pow(exponent)).min(MAX_BACKOFF)
}
