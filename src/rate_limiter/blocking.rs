use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use super::window::{Decision, SlidingWindow};
use crate::config::LimiterConfig;
use crate::error::ConfigError;

/// Thread-safe sliding-window throttle for outbound requests.
///
/// Call `wait_if_needed` once immediately before each request. The log
/// lock is held only to inspect and update the window; a caller that has
/// to wait releases it before sleeping and re-checks afterwards, so other
/// threads keep making progress. Waiters are not served in FIFO order.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<SlidingWindow>,
    max_requests_per_second: f64,
}

impl RateLimiter {
    pub fn new(max_requests_per_second: f64) -> Result<Self, ConfigError> {
        Self::with_config(LimiterConfig::new(max_requests_per_second)?)
    }

    pub fn with_config(config: LimiterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            window: Mutex::new(SlidingWindow::new(config)?),
            max_requests_per_second: config.max_requests_per_second,
        })
    }

    /// Block until one request may be sent, and record it
    pub fn wait_if_needed(&self) {
        self.acquire();
    }

    /// Like `wait_if_needed`, returning the instant the admission was recorded at
    pub fn acquire(&self) -> Instant {
        loop {
            // Guard dropped at the end of this statement, before any sleep
            let decision = self.lock().try_admit(Instant::now());

            match decision {
                Decision::Admitted(at) => {
                    tracing::trace!("Request admitted");
                    return at;
                }
                Decision::Wait(delay) => {
                    tracing::debug!(
                        "Rate limit reached ({} req/s), waiting {:?}",
                        self.max_requests_per_second,
                        delay
                    );
                    thread::sleep(delay);
                }
            }
        }
    }

    pub fn max_requests_per_second(&self) -> f64 {
        self.max_requests_per_second
    }

    /// Admissions still inside the window right now
    pub fn in_flight(&self) -> usize {
        self.lock().occupancy(Instant::now())
    }

    // The window is never left half-updated, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, SlidingWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
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

    /// Every run of `max + 1` consecutive admissions must span at least one second
    fn assert_window_respected(mut admissions: Vec<Instant>, max: usize) {
        admissions.sort();
        for pair in admissions.windows(max + 1) {
            let spread = pair[max].duration_since(pair[0]);
            assert!(
                spread >= Duration::from_secs(1),
                "{} admissions within {:?}",
                max + 1,
                spread
            );
        }
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(RateLimiter::new(0.0).is_err());
        assert!(RateLimiter::new(-3.0).is_err());
        assert!(RateLimiter::new(f64::NAN).is_err());
    }

    #[test]
    fn test_default_rate() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.max_requests_per_second(), 3.0);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn test_high_rate_never_blocks() {
        let limiter = RateLimiter::new(1000.0).unwrap();
        let start = Instant::now();
        for _ in 0..10 {
            limiter.wait_if_needed();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(limiter.in_flight(), 10);
    }

    #[test]
    fn test_low_rate_paces_calls() {
        let limiter = RateLimiter::new(2.0).unwrap();
        let start = Instant::now();
        let admissions: Vec<Instant> = (0..5).map(|_| limiter.acquire()).collect();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(1500), "too fast: {:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(3), "too slow: {:?}", elapsed);
        assert_window_respected(admissions, 2);
    }

    #[test]
    fn test_concurrent_threads_share_ceiling() {
        let limiter = Arc::new(RateLimiter::new(5.0).unwrap());
        let admissions = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admissions = Arc::clone(&admissions);
                thread::spawn(move || {
                    for _ in 0..5 {
                        let at = limiter.acquire();
                        admissions.lock().unwrap().push(at);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let admissions = Arc::try_unwrap(admissions).unwrap().into_inner().unwrap();
        assert_eq!(admissions.len(), 100);
        assert_window_respected(admissions, 5);
    }

    #[test]
    fn test_lock_released_while_waiting() {
        let limiter = Arc::new(RateLimiter::new(1.0).unwrap());
        limiter.wait_if_needed();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.acquire())
        };

        // Give the waiter time to find the window full and go to sleep
        thread::sleep(Duration::from_millis(100));
        let probe = Instant::now();
        assert_eq!(limiter.in_flight(), 1);
        assert!(probe.elapsed() < Duration::from_millis(200));

        let admitted = waiter.join().unwrap();
        assert!(admitted.duration_since(probe) >= Duration::from_millis(500));
    }
}
