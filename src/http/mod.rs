mod client;
mod endpoint;

pub use client::RateLimitedClient;
pub use endpoint::ApiEndpoint;
