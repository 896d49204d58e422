//! State transition logic for circuit breaker.
//!
//! Every function here runs while the caller holds the breaker lock and
//! returns the transition it performed, if any, so the caller can report it
//! once the lock is released.

use super::config::CircuitBreakerConfig;
use super::metrics::BreakerCore;
use super::types::{CircuitState, Transition};

/// Decision taken when a call arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Run the operation; report its result against `generation`
    Proceed { generation: u64, trial: bool },
    /// Short-circuit without running the operation
    Reject { state: CircuitState },
}

/// Handles state transitions for circuit breaker
#[derive(Debug, Clone)]
pub struct StateTransitions {
    config: CircuitBreakerConfig,
}

impl StateTransitions {
    /// Create new state transitions handler
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn transition(core: &mut BreakerCore, to: CircuitState, now_ms: u64) -> Option<Transition> {
        let from = core.state;
        if from == to {
            return None;
        }
        core.state = to;
        core.last_state_change_at_ms = now_ms;
        core.generation += 1;
        core.trial_in_flight = false;
        Some(Transition { from, to })
    }

    /// Decide whether a new call may run, moving Open to HalfOpen once the
    /// recovery timeout has elapsed since the last failure.
    pub fn admit(&self, core: &mut BreakerCore, now_ms: u64) -> (Admission, Option<Transition>) {
        match core.state {
            CircuitState::Closed => (
                Admission::Proceed {
                    generation: core.generation,
                    trial: false,
                },
                None,
            ),
            CircuitState::Open => {
                let last_failure = core.last_failure_at_ms.unwrap_or(core.last_state_change_at_ms);
                if now_ms.saturating_sub(last_failure) < self.config.recovery_timeout_ms {
                    return (
                        Admission::Reject {
                            state: CircuitState::Open,
                        },
                        None,
                    );
                }
                let transition = Self::transition(core, CircuitState::HalfOpen, now_ms);
                core.trial_in_flight = true;
                (
                    Admission::Proceed {
                        generation: core.generation,
                        trial: true,
                    },
                    transition,
                )
            }
            CircuitState::HalfOpen => {
                if core.trial_in_flight {
                    (
                        Admission::Reject {
                            state: CircuitState::HalfOpen,
                        },
                        None,
                    )
                } else {
                    core.trial_in_flight = true;
                    (
                        Admission::Proceed {
                            generation: core.generation,
                            trial: true,
                        },
                        None,
                    )
                }
            }
        }
    }

    /// Record a successful call and handle state transitions
    pub fn record_success(
        &self,
        core: &mut BreakerCore,
        generation: u64,
        now_ms: u64,
    ) -> Option<Transition> {
        // Only record if we're still in the same generation
        if generation != core.generation {
            return None;
        }

        match core.state {
            CircuitState::Closed => {
                core.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                core.consecutive_failures = 0;
                Self::transition(core, CircuitState::Closed, now_ms)
            }
            CircuitState::Open => None,
        }
    }

    /// Record a failed call and handle state transitions
    pub fn record_failure(
        &self,
        core: &mut BreakerCore,
        generation: u64,
        now_ms: u64,
    ) -> Option<Transition> {
        // Only record if we're still in the same generation
        if generation != core.generation {
            return None;
        }

        match core.state {
            CircuitState::Closed => {
                core.consecutive_failures = core.consecutive_failures.saturating_add(1);
                core.last_failure_at_ms = Some(now_ms);
                if core.consecutive_failures >= self.config.failure_threshold {
                    Self::transition(core, CircuitState::Open, now_ms)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                // A failed trial reopens the circuit and restarts the recovery wait
                core.consecutive_failures = core.consecutive_failures.saturating_add(1);
                core.last_failure_at_ms = Some(now_ms);
                Self::transition(core, CircuitState::Open, now_ms)
            }
            CircuitState::Open => None,
        }
    }

    /// Give back the half-open trial slot without a verdict (pending or
    /// abandoned call)
    pub fn release_trial(&self, core: &mut BreakerCore, generation: u64) {
        if generation == core.generation && core.state == CircuitState::HalfOpen {
            core.trial_in_flight = false;
        }
    }
}
