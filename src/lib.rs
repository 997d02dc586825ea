pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod rate_limiter;

#[cfg(feature = "python")]
mod python;

// Re-export main types
pub use config::{ClientConfig, LimiterConfig};
pub use error::{ClientError, ConfigError};
pub use http::{ApiEndpoint, RateLimitedClient};
pub use rate_limiter::{AsyncRateLimiter, RateLimiter};
