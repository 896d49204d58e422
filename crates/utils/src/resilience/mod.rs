//! Resilience patterns: retries, circuit breakers and timeout races.
//!
//! This module provides mechanisms to build robust, fault-tolerant systems
//! that can gracefully handle and recover from transient failures.
//!
//! ## Key Components
//!
//! - **`retry`**: Bounded retries with exponential backoff, driven by the
//!   retryability table of the failure taxonomy.
//! - **`circuit`**: Implements the circuit breaker pattern to prevent
//!   repeatedly calling a service that is known to be failing.
//! - **`race`**: Runs competing operations and keeps the first success,
//!   bounded by a deadline.

pub mod circuit;
pub mod race;
pub mod retry;

pub use circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use race::{race_with_timeout, TimeoutRace};
pub use retry::{
    retry_with_circuit_breaker, suggest_recovery, with_retry, RetryController, RetryPolicy,
};
