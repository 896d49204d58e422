//! Bounded retry with exponential backoff.
//!
//! Only failures listed as retryable in the failure taxonomy are retried.
//! Attempts run strictly one after another, and the failure returned after
//! the last attempt is the last one observed.

mod policy;

pub use policy::RetryPolicy;

use crate::resilience::circuit::CircuitBreaker;
use crate::sync::CancellationToken;
use std::future::Future;
use std::sync::Arc;
use tether_core::{
    attributes, Failure, NoopSink, Outcome, SharedSink, EVENT_RETRY_ATTEMPT, EVENT_RETRY_EXHAUSTED,
};
use tokio::time::sleep;

/// Runs operations under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    name: String,
    sink: SharedSink,
    cancellation: CancellationToken,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            name: "operation".to_string(),
            sink: Arc::new(NoopSink),
            cancellation: CancellationToken::new(),
        }
    }

    /// Name reported in events and cancellation failures
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation` until it succeeds, reports progress, fails with a
    /// non-retryable failure, or runs out of attempts.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let max_attempts = self.policy.max_attempts;
        if max_attempts == 0 {
            self.sink.emit(
                EVENT_RETRY_EXHAUSTED,
                &attributes([
                    ("operation", self.name.clone()),
                    ("attempts", "0".to_string()),
                ]),
            );
            return Outcome::Error(Failure::retries_exhausted(0));
        }

        let mut attempt: u32 = 0;
        loop {
            if self.cancellation.is_cancelled() {
                return Outcome::Error(Failure::cancelled(self.name.clone()));
            }

            let outcome = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    return Outcome::Error(Failure::cancelled(self.name.clone()));
                }
                outcome = operation() => outcome,
            };

            let failure = match outcome {
                Outcome::Success(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            operation = %self.name,
                            retries = attempt,
                            "Operation succeeded after retries"
                        );
                    }
                    return Outcome::Success(value);
                }
                Outcome::InProgress => return Outcome::InProgress,
                Outcome::Error(failure) => failure,
            };

            let retryable = failure.is_retryable();
            if !retryable || attempt + 1 >= max_attempts {
                if retryable {
                    self.sink.emit(
                        EVENT_RETRY_EXHAUSTED,
                        &attributes([
                            ("operation", self.name.clone()),
                            ("attempts", (attempt + 1).to_string()),
                            ("failure", failure.code().to_string()),
                        ]),
                    );
                }
                return Outcome::Error(failure);
            }

            let delay = self.policy.delay_for_attempt(attempt);
            tracing::warn!(
                operation = %self.name,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Operation failed, retrying"
            );
            self.sink.emit(
                EVENT_RETRY_ATTEMPT,
                &attributes([
                    ("operation", self.name.clone()),
                    ("attempt", (attempt + 1).to_string()),
                    ("delay_ms", delay.as_millis().to_string()),
                    ("failure", failure.code().to_string()),
                ]),
            );

            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    return Outcome::Error(Failure::cancelled(self.name.clone()));
                }
                _ = sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

/// Execute an operation with retry logic
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Outcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    RetryController::new(policy.clone()).run(operation).await
}

/// Retry with circuit breaker protection
pub async fn retry_with_circuit_breaker<F, Fut, T>(
    policy: &RetryPolicy,
    circuit_breaker: &CircuitBreaker,
    operation: F,
) -> Outcome<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    with_retry(policy, || circuit_breaker.execute(&operation)).await
}

/// Helper to suggest recovery actions based on failure category
pub fn suggest_recovery(failure: &Failure) -> String {
    match failure {
        Failure::Network(_) => "Network error: Check your internet connection and try again. \
             If the problem persists, the service may be temporarily unavailable."
            .to_string(),
        Failure::Storage(_) => "Storage error: Check available disk space and permissions \
             for the cache location."
            .to_string(),
        Failure::Validation(inner) => {
            format!("Validation error: {inner}. Correct the input and try again.")
        }
        Failure::Concurrency(tether_core::errors::ConcurrencyFailure::CircuitOpen { .. }) => {
            "The service is temporarily unavailable after repeated failures. \
             Wait a moment before trying again."
                .to_string()
        }
        Failure::Concurrency(_) => "Operation timed out or was interrupted: Try again, or \
             increase the timeout if possible."
            .to_string(),
        Failure::Security(_) => "Access denied: Sign in again or check that your account \
             has access to this resource."
            .to_string(),
        Failure::Configuration(inner) => {
            format!("Configuration error: {inner}. Check your tether configuration file.")
        }
        Failure::Unknown { .. } => {
            "An error occurred. Please check the logs for more details.".to_string()
        }
    }
}
