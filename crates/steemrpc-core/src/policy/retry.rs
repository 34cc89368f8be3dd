//! Bounded retry with linear, capped backoff.
//!
//! After the `n`-th consecutive failure the engine waits
//! `min((n - 1) * 2, 10)` time units: 0, 2, 4, 6, 8, 10, 10, ...

use std::time::Duration;

/// Upper bound on the backoff, in time units.
pub const MAX_BACKOFF_UNITS: u32 = 10;

/// Configuration for the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt. `None` retries forever.
    pub max_retries: Option<u32>,
    /// Length of one backoff time unit.
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Backoff, in time units, after the `attempt`-th failure (1-based).
pub fn backoff_units(attempt: u32) -> u32 {
    attempt
        .saturating_sub(1)
        .saturating_mul(2)
        .min(MAX_BACKOFF_UNITS)
}

/// Decides whether to retry and how long to wait first.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the delay to wait after the `attempt`-th failure.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.config.backoff_unit * backoff_units(attempt)
    }

    /// Returns `true` if another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.config.max_retries.map_or(true, |max| attempt <= max)
    }
}
