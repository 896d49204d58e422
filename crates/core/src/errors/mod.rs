//! Failure taxonomy for tether operations

mod builders;
mod conversions;
mod extensions;
mod policy;
mod types;

pub use extensions::*;
pub use policy::{RETRYABILITY, USER_FACING};
pub use types::{
    ConcurrencyFailure, ConfigurationFailure, Failure, FailureKind, NetworkFailure, Result,
    SecurityFailure, StorageFailure, ValidationFailure,
};
