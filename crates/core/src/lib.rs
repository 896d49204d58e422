//! Core types for the `tether` resilience and caching workspace.
//!
//! Everything that crosses a component boundary is defined here so that the
//! resilience primitives and the cache layer share one vocabulary.
//!
//! ## Key Components
//!
//! - **`outcome`**: The three-state `Outcome` algebra returned by every
//!   operation instead of raising.
//! - **`errors`**: The closed `Failure` taxonomy and its retry and
//!   user-facing policy tables.
//! - **`clock`**: Injectable time source used for freshness and recovery
//!   timeouts.
//! - **`events`**: The observability sink callbacks are reported through.
//! - **`constants`**: Event names and environment variable names.

pub mod clock;
pub mod constants;
pub mod errors;
pub mod events;
pub mod outcome;

pub use self::{
    clock::{Clock, ManualClock, SystemClock},
    constants::*,
    errors::{Failure, FailureKind, Result, ResultExt},
    events::{attributes, Attributes, EventSink, NoopSink, RecordingSink, SharedSink, TracingSink},
    outcome::Outcome,
};
