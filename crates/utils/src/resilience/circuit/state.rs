//! Circuit breaker state management and execution logic.

use super::config::CircuitBreakerConfig;
use super::metrics::MetricsState;
use super::transitions::{Admission, StateTransitions};
use super::types::{CircuitBreakerStats, CircuitState, Transition};
use crate::sync::CancellationToken;
use std::future::Future;
use std::sync::Arc;
use tether_core::{
    attributes, Clock, Failure, NoopSink, Outcome, SharedSink, SystemClock,
    EVENT_CIRCUIT_REJECTED, EVENT_CIRCUIT_STATE_CHANGED,
};

/// Circuit breaker implementation
///
/// Share one instance (behind an `Arc`) between every caller of the same
/// dependency; each instance owns its state exclusively.
pub struct CircuitBreaker {
    name: String,
    metrics: MetricsState,
    transitions: StateTransitions,
    clock: Arc<dyn Clock>,
    sink: SharedSink,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            name: "default".to_string(),
            metrics: MetricsState::new(clock.now_ms()),
            transitions: StateTransitions::new(config),
            clock,
            sink: Arc::new(NoopSink),
        }
    }

    /// Name reported in events and rejection failures
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use `clock` for failure timestamps and recovery timing
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.metrics = MetricsState::new(clock.now_ms());
        self.clock = clock;
        self
    }

    /// Report state changes and rejections to `sink`
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        self.transitions.config()
    }

    /// Get the current state of the circuit.
    ///
    /// This is a plain read: an open circuit only becomes half-open when a
    /// call arrives after the recovery timeout.
    pub fn state(&self) -> CircuitState {
        self.metrics.state()
    }

    /// Get current circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        self.metrics.stats()
    }

    /// Execute an operation through the circuit breaker
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let Some(mut call) = self.admit() else {
            return Outcome::Error(self.rejection());
        };

        let outcome = operation().await;
        call.settle(&outcome);
        outcome
    }

    /// Execute an operation, giving up with `OperationCancelled` when
    /// `cancellation` fires. A cancelled call is not counted as a failure.
    pub async fn execute_with_cancellation<F, Fut, T>(
        &self,
        cancellation: &CancellationToken,
        operation: F,
    ) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        if cancellation.is_cancelled() {
            return Outcome::Error(Failure::cancelled(self.name.clone()));
        }
        let Some(mut call) = self.admit() else {
            return Outcome::Error(self.rejection());
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                // Dropping `call` unsettled hands the trial slot back
                drop(call);
                Outcome::Error(Failure::cancelled(self.name.clone()))
            }
            outcome = operation() => {
                call.settle(&outcome);
                outcome
            }
        }
    }

    fn admit(&self) -> Option<CallGuard<'_>> {
        let now = self.clock.now_ms();
        let (admission, transition) = self
            .metrics
            .with_core(|core| self.transitions.admit(core, now));
        self.report(transition);

        match admission {
            Admission::Proceed { generation, trial } => Some(CallGuard {
                breaker: self,
                generation,
                trial,
                settled: false,
            }),
            Admission::Reject { state } => {
                self.metrics.record_rejection();
                tracing::debug!(breaker = %self.name, %state, "Circuit breaker rejected call");
                self.sink.emit(
                    EVENT_CIRCUIT_REJECTED,
                    &attributes([
                        ("breaker", self.name.clone()),
                        ("state", state.to_string()),
                    ]),
                );
                None
            }
        }
    }

    fn rejection(&self) -> Failure {
        Failure::circuit_open(format!(
            "circuit '{}' is open - service unavailable",
            self.name
        ))
    }

    fn report(&self, transition: Option<Transition>) {
        let Some(Transition { from, to }) = transition else {
            return;
        };

        match to {
            CircuitState::Open => {
                tracing::warn!(breaker = %self.name, %from, "Circuit breaker opening")
            }
            CircuitState::HalfOpen => {
                tracing::info!(breaker = %self.name, "Circuit breaker entering half-open state")
            }
            CircuitState::Closed => {
                tracing::info!(breaker = %self.name, "Circuit breaker closing")
            }
        }

        self.sink.emit(
            EVENT_CIRCUIT_STATE_CHANGED,
            &attributes([
                ("breaker", self.name.clone()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ]),
        );
    }
}

/// Tracks one admitted call until its result is recorded.
///
/// If the call is dropped before settling (caller cancelled, future
/// abandoned), the half-open trial slot is released so the breaker does not
/// stay blocked.
struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl CallGuard<'_> {
    fn settle<T>(&mut self, outcome: &Outcome<T>) {
        self.settled = true;
        let breaker = self.breaker;
        let now = breaker.clock.now_ms();
        let generation = self.generation;

        let transition = match outcome {
            Outcome::Success(_) => {
                breaker.metrics.record_success();
                breaker
                    .metrics
                    .with_core(|core| breaker.transitions.record_success(core, generation, now))
            }
            Outcome::Error(_) => {
                breaker.metrics.record_failure();
                breaker
                    .metrics
                    .with_core(|core| breaker.transitions.record_failure(core, generation, now))
            }
            Outcome::InProgress => {
                if self.trial {
                    breaker
                        .metrics
                        .with_core(|core| breaker.transitions.release_trial(core, generation));
                }
                None
            }
        };
        breaker.report(transition);
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            let breaker = self.breaker;
            let generation = self.generation;
            breaker
                .metrics
                .with_core(|core| breaker.transitions.release_trial(core, generation));
        }
    }
}
