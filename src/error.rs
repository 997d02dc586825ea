use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid rate ceiling: {0} (must be a finite number > 0)")]
    InvalidRate(f64),

    #[error("Invalid window: span must be greater than zero")]
    InvalidWindow,

    #[error("Invalid retry count: {0} (must be between 1 and {max})", max = crate::config::MAX_RETRIES_LIMIT)]
    InvalidRetries(usize),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Whether another attempt may succeed (network trouble, 429, 5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ClientError::Status(429).is_retryable());
        assert!(ClientError::Status(503).is_retryable());
        assert!(!ClientError::Status(404).is_retryable());
        assert!(!ClientError::InvalidUrl(String::new()).is_retryable());
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::InvalidRate(-1.0);
        assert!(err.to_string().contains("-1"));
    }
}
