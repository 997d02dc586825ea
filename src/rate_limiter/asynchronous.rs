use std::time::Instant;
use tokio::sync::Mutex;

use super::window::{Decision, SlidingWindow};
use crate::config::LimiterConfig;
use crate::error::ConfigError;

/// `RateLimiter` for tokio callers: waiting suspends the task, not the thread.
/// Dropping a pending `acquire` future records nothing.
#[derive(Debug)]
pub struct AsyncRateLimiter {
    window: Mutex<SlidingWindow>,
    max_requests_per_second: f64,
}

impl AsyncRateLimiter {
    pub fn new(max_requests_per_second: f64) -> Result<Self, ConfigError> {
        Self::with_config(LimiterConfig::new(max_requests_per_second)?)
    }

    pub fn with_config(config: LimiterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            window: Mutex::new(SlidingWindow::new(config)?),
            max_requests_per_second: config.max_requests_per_second,
        })
    }

    pub async fn wait_if_needed(&self) {
        self.acquire().await;
    }

    pub async fn acquire(&self) -> Instant {
        loop {
            let decision = {
                let mut window = self.window.lock().await;
                window.try_admit(Instant::now())
            };

            match decision {
                Decision::Admitted(at) => return at,
                Decision::Wait(delay) => {
                    tracing::debug!(
                        "Rate limit reached ({} req/s), waiting {:?}",
                        self.max_requests_per_second,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub fn max_requests_per_second(&self) -> f64 {
        self.max_requests_per_second
    }

    pub async fn in_flight(&self) -> usize {
        self.window.lock().await.occupancy(Instant::now())
    }
}

impl Default for AsyncRateLimiter {
    fn default() -> Self {
        let window = SlidingWindow::default();
        Self {
            max_requests_per_second: window.max_requests(),
            window: Mutex::new(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_async_paces_calls() {
        let limiter = AsyncRateLimiter::new(2.0).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait_if_needed().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "too fast: {:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(2), "too slow: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_async_concurrent_tasks() {
        let limiter = Arc::new(AsyncRateLimiter::new(10.0).unwrap());
        let mut tasks = Vec::new();
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            tasks.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..2 {
                    seen.push(limiter.acquire().await);
                }
                seen
            }));
        }

        let mut admissions = Vec::new();
        for task in tasks {
            admissions.extend(task.await.unwrap());
        }
        admissions.sort();

        assert_eq!(admissions.len(), 20);
        for run in admissions.windows(11) {
            assert!(run[10].duration_since(run[0]) >= Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn test_cancelled_wait_records_nothing() {
        let limiter = AsyncRateLimiter::new(1.0).unwrap();
        limiter.wait_if_needed().await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), limiter.wait_if_needed()).await;
        assert!(timed_out.is_err());
        assert_eq!(limiter.in_flight().await, 1);
    }

    #[test]
    fn test_async_rejects_bad_rate() {
        assert!(AsyncRateLimiter::new(0.0).is_err());
        assert_eq!(AsyncRateLimiter::default().max_requests_per_second(), 3.0);
    }
}
