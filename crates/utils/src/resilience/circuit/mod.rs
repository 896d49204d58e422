//! Circuit breaker protecting a failing dependency.
//!
//! ## Architecture
//!
//! - [`types`] - Core types and enums (CircuitState, stats)
//! - [`config`] - Configuration for failure threshold and recovery timeout
//! - [`metrics`] - Locked breaker state and statistics counters
//! - [`transitions`] - State transition rules
//! - [`state`] - The `CircuitBreaker` itself
//! - [`tests`] - Integration tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use tether_core::Outcome;
//! use tether_utils::resilience::circuit::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Outcome<String> {
//! let cb = CircuitBreaker::new(CircuitBreakerConfig::default()).with_name("profile-api");
//!
//! cb.execute(|| async {
//!     // Your operation here
//!     Outcome::Success("success".to_string())
//! })
//! .await
//! # }
//! ```

pub mod config;
pub mod metrics;
pub mod state;
pub mod transitions;
pub mod types;

// Re-export public API
pub use config::CircuitBreakerConfig;
pub use state::CircuitBreaker;
pub use types::{CircuitBreakerStats, CircuitState};
