use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::LimiterConfig;
use crate::error::ConfigError;

/// Outcome of one admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Recorded at this instant; the caller may send one request
    Admitted(Instant),
    /// Window is full; retry after this long
    Wait(Duration),
}

/// Timestamp log of admissions inside a trailing window.
///
/// Holds no lock and never sleeps: the limiters wrap it in their own mutex
/// and do the waiting themselves. Timestamps are kept in admission order,
/// so the front is always the oldest.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    log: VecDeque<Instant>,
    max_requests: f64,
    span: Duration,
}

impl SlidingWindow {
    pub fn new(config: LimiterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            log: VecDeque::with_capacity(initial_capacity(config.max_requests_per_second)),
            max_requests: config.max_requests_per_second,
            span: config.window,
        })
    }

    /// Drop every timestamp that has left the window as of `now`
    pub fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.log.front() {
            if now.saturating_duration_since(oldest) >= self.span {
                self.log.pop_front();
            } else {
                break;
            }
        }
    }

    /// Evict, then either record `now` or report how long until a slot frees.
    pub fn try_admit(&mut self, now: Instant) -> Decision {
        self.evict(now);

        if (self.log.len() as f64) < self.max_requests {
            self.log.push_back(now);
            return Decision::Admitted(now);
        }

        // len >= max_requests > 0, so the log is non-empty here
        let wait = match self.log.front() {
            Some(&oldest) => self
                .span
                .saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        };
        Decision::Wait(wait)
    }

    /// Retained admissions as of `now`
    pub fn occupancy(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.log.len()
    }

    pub fn max_requests(&self) -> f64 {
        self.max_requests
    }

    pub fn span(&self) -> Duration {
        self.span
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        let config = LimiterConfig::default();
        Self {
            log: VecDeque::with_capacity(initial_capacity(config.max_requests_per_second)),
            max_requests: config.max_requests_per_second,
            span: config.window,
        }
    }
}

fn initial_capacity(max_requests: f64) -> usize {
    (max_requests.ceil() as usize).min(1024)
}
