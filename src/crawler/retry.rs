//! Retry policy for failed fetches
//!
//! A job that fails with a transient error is re-fetched after an exponential
//! backoff: `backoff_factor * 2^attempt` seconds, capped at `max_backoff`.

use crate::config::Config;
use std::time::Duration;

/// How often and how patiently a fetch is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Base delay in seconds
    pub backoff_factor: f64,

    /// Upper bound of a single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_factor: 0.0,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.retry_count,
            backoff_factor: config.backoff_factor,
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }

    /// Delay before retry number `attempt + 1`
    ///
    /// # Backoff schedule (example with `backoff_factor = 1.0`)
    ///
    /// | Attempt | Sleep before next attempt |
    /// |---------|--------------------------|
    /// | 0 | 1 s |
    /// | 1 | 2 s |
    /// | 2 | 4 s |
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt.min(30) as i32);
        let capped = secs.min(self.max_backoff.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_factor: 1.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}
