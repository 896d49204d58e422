//! Extension traits for failure handling

use super::types::Failure;
use crate::outcome::Outcome;

/// Extension trait for converting foreign `Result`s at a component boundary
pub trait ResultExt<T> {
    /// Convert into an `Outcome`, mapping the error through `Into<Failure>`
    fn into_outcome(self) -> Outcome<T>;

    /// Convert into an `Outcome`, choosing the failure case explicitly
    fn or_failure<F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(String) -> Failure;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Failure> + std::fmt::Display,
{
    fn into_outcome(self) -> Outcome<T> {
        Outcome::from(self)
    }

    fn or_failure<F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(String) -> Failure,
    {
        match self {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Error(f(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    #[test]
    fn test_or_failure_uses_message() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        let outcome = result.or_failure(|detail| Failure::database_error("write", detail));

        let failure = outcome.failure().cloned().unwrap();
        assert_eq!(failure.kind(), FailureKind::StorageDatabaseError);
        assert!(failure.to_string().contains("disk on fire"));
    }
}
