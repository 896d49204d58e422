//! Retry policy configuration and backoff arithmetic.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tether_core::{Failure, Result};

/// Default number of attempts, including the first one
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry (100ms)
const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default exponential growth factor
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default upper bound on any single delay (10s)
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Immutable retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Cap for any single delay
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_delay_ms: u64,
        backoff_factor: f64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            backoff_factor,
            max_delay_ms,
        }
    }

    /// Create a retry policy for remote fetches
    pub fn for_network() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 200,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }

    /// Create a retry policy for local persistence
    pub fn for_storage() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 50,
            backoff_factor: 2.0,
            max_delay_ms: 2_000,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the zero-based `attempt` failed:
    /// `min(initial_delay_ms * backoff_factor^attempt, max_delay_ms)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let max = self.max_delay_ms as f64;
        let capped = if raw.is_finite() { raw.min(max) } else { max };
        Duration::from_millis(capped.max(0.0).round() as u64)
    }

    /// Check the policy for values that would make backoff meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Failure::invalid_config(
                "retry.backoff_factor",
                format!("must be a finite number >= 1.0, got {}", self.backoff_factor),
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(Failure::invalid_config(
                "retry.initial_delay_ms",
                format!(
                    "{} exceeds max_delay_ms {}",
                    self.initial_delay_ms, self.max_delay_ms
                ),
            ));
        }
        Ok(())
    }
}
