//! State and statistics tracking for circuit breaker.

use super::types::{CircuitBreakerStats, CircuitState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mutable breaker state; only ever touched under the `MetricsState` lock
#[derive(Debug)]
pub struct BreakerCore {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub last_failure_at_ms: Option<u64>,
    pub last_state_change_at_ms: u64,
    /// Bumped on every transition so results from an earlier state are ignored
    pub generation: u64,
    pub trial_in_flight: bool,
}

/// Internal state tracking for circuit breaker metrics
#[derive(Debug)]
pub struct MetricsState {
    core: Mutex<BreakerCore>,
    total_successes: AtomicU64,
    total_failures: AtomicU64,
    rejected_calls: AtomicU64,
}

impl MetricsState {
    /// Create new metrics state, closed as of `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            core: Mutex::new(BreakerCore {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure_at_ms: None,
                last_state_change_at_ms: now_ms,
                generation: 0,
                trial_in_flight: false,
            }),
            total_successes: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
        }
    }

    /// Run `f` with exclusive access to the breaker state.
    ///
    /// The lock is synchronous; `f` must not await or call back into the
    /// breaker.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut BreakerCore) -> R) -> R {
        let mut core = self.core.lock();
        f(&mut core)
    }

    pub fn state(&self) -> CircuitState {
        self.core.lock().state
    }

    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejected_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let core = self.core.lock();
        CircuitBreakerStats {
            state: core.state,
            consecutive_failures: core.consecutive_failures,
            last_failure_at_ms: core.last_failure_at_ms,
            last_state_change_at_ms: core.last_state_change_at_ms,
            trial_in_flight: core.trial_in_flight,
            total_successes: self.total_successes.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
        }
    }
}
