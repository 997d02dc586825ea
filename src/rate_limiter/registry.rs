//! Process-wide limiters, one per API, shared by every client that talks to it

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::blocking::RateLimiter;
use crate::config::LimiterConfig;
use crate::error::ConfigError;
use crate::http::ApiEndpoint;

static LIMITERS: Lazy<Mutex<HashMap<ApiEndpoint, Arc<RateLimiter>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Get or create the limiter for `endpoint`
pub fn shared(endpoint: ApiEndpoint) -> Result<Arc<RateLimiter>, ConfigError> {
    let mut limiters = LIMITERS.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(limiter) = limiters.get(&endpoint) {
        return Ok(Arc::clone(limiter));
    }

    let config = LimiterConfig::for_endpoint(endpoint)?;
    let limiter = Arc::new(RateLimiter::with_config(config)?);
    tracing::info!(
        "Created rate limiter for {}: {} req/s",
        endpoint,
        config.max_requests_per_second
    );
    limiters.insert(endpoint, Arc::clone(&limiter));
    Ok(limiter)
}

/// Replace the limiter for `endpoint`; clients created earlier keep the old one
pub fn install(endpoint: ApiEndpoint, limiter: Arc<RateLimiter>) {
    let mut limiters = LIMITERS.lock().unwrap_or_else(PoisonError::into_inner);
    limiters.insert(endpoint, limiter);
}
