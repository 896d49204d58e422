//! Shared utilities for tether
//!
//! This crate provides the resilience primitives (retry, circuit breaker,
//! timeout race) along with the small pieces they depend on: cooperative
//! cancellation, atomic file writes and tracing setup.

pub mod atomic_file;
pub mod resilience;
pub mod sync;
pub mod tracing;

pub use atomic_file::*;
pub use resilience::*;
pub use sync::*;
