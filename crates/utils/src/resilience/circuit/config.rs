//! Configuration for circuit breaker behavior.

use serde::{Deserialize, Serialize};
use tether_core::{Failure, Result};

/// Default consecutive failures before the circuit opens
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time the circuit stays open before allowing a trial call (30s)
const DEFAULT_RECOVERY_TIMEOUT_MS: u64 = 30_000;

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time after the last failure before a trial call is let through
    pub recovery_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout_ms: DEFAULT_RECOVERY_TIMEOUT_MS,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_timeout_ms: u64) -> Self {
        Self {
            failure_threshold,
            recovery_timeout_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(Failure::invalid_config(
                "circuit_breaker.failure_threshold",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
