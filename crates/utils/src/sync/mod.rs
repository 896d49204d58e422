//! Synchronisation helpers shared across the workspace

pub mod cancel;

pub use cancel::CancellationToken;
