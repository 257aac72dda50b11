//! Retry schedule for durable executions.
//!
//! A [`RetryPolicy`] describes how many times a unit of work may run and how
//! long to wait between runs. The schedule is exponential and capped:
//!
//! ```text
//! backoff(n) = min(initial_interval * backoff_coefficient^(n-1), maximum_interval)
//! ```
//!
//! where `n` is the 1-based number of the attempt that just failed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);

/// Default growth factor between consecutive delays.
pub const DEFAULT_BACKOFF_COEFFICIENT: f64 = 2.0;

/// Default cap on any single delay.
pub const DEFAULT_MAXIMUM_INTERVAL: Duration = Duration::from_secs(60);

/// Default total number of attempts, including the first.
pub const DEFAULT_MAXIMUM_ATTEMPTS: u32 = 3;

/// Exponential, capped retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    initial_interval: Duration,
    backoff_coefficient: f64,
    maximum_interval: Duration,
    maximum_attempts: u32,
}

impl RetryPolicy {
    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `maximum_attempts` is zero, the
    /// coefficient is below `1.0` (or not finite), or `initial_interval`
    /// exceeds `maximum_interval`.
    pub fn new(
        initial_interval: Duration,
        backoff_coefficient: f64,
        maximum_interval: Duration,
        maximum_attempts: u32,
    ) -> Result<Self, ConfigurationError> {
        if maximum_attempts == 0 {
            return Err(ConfigurationError::new(
                "retry.maximum_attempts must be at least 1",
            ));
        }
        if !backoff_coefficient.is_finite() || backoff_coefficient < 1.0 {
            return Err(ConfigurationError::new(format!(
                "retry.backoff_coefficient must be >= 1.0, got {backoff_coefficient}"
            )));
        }
        if initial_interval > maximum_interval {
            return Err(ConfigurationError::new(format!(
                "retry.initial_interval ({initial_interval:?}) exceeds maximum_interval ({maximum_interval:?})"
            )));
        }
        Ok(Self {
            initial_interval,
            backoff_coefficient,
            maximum_interval,
            maximum_attempts,
        })
    }

    /// A policy that runs the unit of work exactly once.
    pub fn no_retry() -> Self {
        Self {
            maximum_attempts: 1,
            ..Self::default()
        }
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn backoff_coefficient(&self) -> f64 {
        self.backoff_coefficient
    }

    pub fn maximum_interval(&self) -> Duration {
        self.maximum_interval
    }

    pub fn maximum_attempts(&self) -> u32 {
        self.maximum_attempts
    }

    /// Returns `true` if another attempt may follow attempt number `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.maximum_attempts
    }

    /// Delay to wait after attempt number `attempt` (1-based) failed.
    ///
    /// Non-decreasing in `attempt` and never above `maximum_interval`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_coefficient.powi(exponent);
        let scaled = self.initial_interval.as_secs_f64() * factor;
        let cap = self.maximum_interval.as_secs_f64();
        if !scaled.is_finite() || scaled >= cap {
            return self.maximum_interval;
        }
        Duration::from_secs_f64(scaled)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            backoff_coefficient: DEFAULT_BACKOFF_COEFFICIENT,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            maximum_attempts: DEFAULT_MAXIMUM_ATTEMPTS,
        }
    }
}
