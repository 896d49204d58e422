//! Three-state result algebra returned by every operation in the core.

use crate::errors::Failure;
use serde::{Deserialize, Serialize};

/// Result of an operation that may have succeeded, failed, or still be pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
#[must_use]
pub enum Outcome<T> {
    Success(T),
    Error(Failure),
    InProgress,
}

impl<T> Outcome<T> {
    pub const fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Outcome::InProgress)
    }

    /// Borrow the success payload, if any
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the failure, if any
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Transform the success payload; other variants pass through unchanged.
    pub fn map<U, F>(self, transform: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(transform(value)),
            Outcome::Error(failure) => Outcome::Error(failure),
            Outcome::InProgress => Outcome::InProgress,
        }
    }

    /// Chain an operation that itself produces an `Outcome`.
    pub fn flat_map<U, F>(self, transform: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Outcome::Success(value) => transform(value),
            Outcome::Error(failure) => Outcome::Error(failure),
            Outcome::InProgress => Outcome::InProgress,
        }
    }

    /// Transform the failure; other variants pass through unchanged.
    pub fn map_failure<F>(self, transform: F) -> Outcome<T>
    where
        F: FnOnce(Failure) -> Failure,
    {
        match self {
            Outcome::Error(failure) => Outcome::Error(transform(failure)),
            other => other,
        }
    }

    pub fn on_success<F>(self, action: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let Outcome::Success(value) = &self {
            action(value);
        }
        self
    }

    pub fn on_error<F>(self, action: F) -> Self
    where
        F: FnOnce(&Failure),
    {
        if let Outcome::Error(failure) = &self {
            action(failure);
        }
        self
    }

    pub fn on_in_progress<F>(self, action: F) -> Self
    where
        F: FnOnce(),
    {
        if self.is_in_progress() {
            action();
        }
        self
    }

    /// The success payload, or `default` for any other variant.
    pub fn get_or_default(self, default: T) -> T {
        match self {
            Outcome::Success(value) => value,
            _ => default,
        }
    }

    /// The success payload, or `None` for any other variant.
    pub fn get_or_none(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a `Result`; `InProgress` yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, Failure> {
        match self {
            Outcome::Success(value) => Ok(Some(value)),
            Outcome::Error(failure) => Err(failure),
            Outcome::InProgress => Ok(None),
        }
    }

    /// Combine many outcomes into one.
    ///
    /// The first `Error` in iteration order wins. Without errors, any
    /// `InProgress` makes the whole result `InProgress`. Otherwise every
    /// payload is returned in input order.
    pub fn combine<I>(outcomes: I) -> Outcome<Vec<T>>
    where
        I: IntoIterator<Item = Outcome<T>>,
    {
        let mut values = Vec::new();
        let mut pending = false;

        for outcome in outcomes {
            match outcome {
                Outcome::Success(value) => values.push(value),
                Outcome::Error(failure) => return Outcome::Error(failure),
                Outcome::InProgress => pending = true,
            }
        }

        if pending {
            Outcome::InProgress
        } else {
            Outcome::Success(values)
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<Failure>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Error(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn e1() -> Failure {
        Failure::network_timeout(100)
    }

    fn e2() -> Failure {
        Failure::no_connection()
    }

    #[test]
    fn test_combine_first_error_wins() {
        let outcomes = vec![
            Outcome::Success(1),
            Outcome::Error(e1()),
            Outcome::Error(e2()),
        ];
        assert_eq!(Outcome::combine(outcomes), Outcome::Error(e1()));
    }

    #[test]
    fn test_combine_error_beats_in_progress() {
        let outcomes = vec![Outcome::InProgress, Outcome::Error(e2()), Outcome::Success(3)];
        assert_eq!(Outcome::combine(outcomes), Outcome::Error(e2()));
    }

    #[test]
    fn test_combine_in_progress_without_errors() {
        let outcomes = vec![Outcome::Success(1), Outcome::InProgress];
        assert_eq!(Outcome::combine(outcomes), Outcome::InProgress);
    }

    #[test]
    fn test_combine_preserves_order() {
        let outcomes = vec![Outcome::Success(1), Outcome::Success(2)];
        assert_eq!(Outcome::combine(outcomes), Outcome::Success(vec![1, 2]));
        assert_eq!(
            Outcome::<u8>::combine(Vec::new()),
            Outcome::Success(Vec::new())
        );
    }

    #[test]
    fn test_map_and_flat_map_pass_through() {
        assert_eq!(Outcome::Success(2).map(|v| v * 10), Outcome::Success(20));
        assert_eq!(
            Outcome::<i32>::Error(e1()).map(|v| v * 10),
            Outcome::Error(e1())
        );
        assert_eq!(Outcome::<i32>::InProgress.map(|v| v * 10), Outcome::InProgress);

        let halve = |v: i32| {
            if v % 2 == 0 {
                Outcome::Success(v / 2)
            } else {
                Outcome::Error(Failure::invalid_input("v", "odd"))
            }
        };
        assert_eq!(Outcome::Success(8).flat_map(halve), Outcome::Success(4));
        assert!(Outcome::Success(7).flat_map(halve).is_error());
    }

    #[test]
    fn test_side_effects_keep_variant() {
        let hits = Cell::new(0);

        let outcome = Outcome::Success("ok")
            .on_success(|_| hits.set(hits.get() + 1))
            .on_error(|_| hits.set(hits.get() + 10))
            .on_in_progress(|| hits.set(hits.get() + 100));
        assert_eq!(outcome, Outcome::Success("ok"));
        assert_eq!(hits.get(), 1);

        let outcome = Outcome::<&str>::Error(e1()).on_error(|f| assert_eq!(f, &e1()));
        assert_eq!(outcome, Outcome::Error(e1()));

        let outcome = Outcome::<&str>::InProgress.on_in_progress(|| hits.set(0));
        assert!(outcome.is_in_progress());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_get_or_default() {
        assert_eq!(Outcome::Success(5).get_or_default(0), 5);
        assert_eq!(Outcome::Error(e1()).get_or_default(0), 0);
        assert_eq!(Outcome::InProgress.get_or_default(0), 0);
    }

    #[test]
    fn test_from_result() {
        let ok: Result<u8, std::io::Error> = Ok(1);
        assert_eq!(Outcome::from(ok), Outcome::Success(1));

        let err: Result<u8, Failure> = Err(e2());
        assert_eq!(Outcome::from(err), Outcome::Error(e2()));
    }

    fn any_outcome() -> impl Strategy<Value = Outcome<i64>> {
        prop_oneof![
            any::<i64>().prop_map(Outcome::Success),
            any::<u64>().prop_map(|ms| Outcome::Error(Failure::network_timeout(ms))),
            Just(Outcome::InProgress),
        ]
    }

    proptest! {
        #[test]
        fn prop_exactly_one_variant(outcome in any_outcome()) {
            let flags = [outcome.is_success(), outcome.is_error(), outcome.is_in_progress()];
            prop_assert_eq!(flags.iter().filter(|flag| **flag).count(), 1);
        }

        #[test]
        fn prop_combine_matches_first_error(outcomes in prop::collection::vec(any_outcome(), 0..16)) {
            let first_error = outcomes.iter().find_map(|o| o.failure().cloned());
            let any_pending = outcomes.iter().any(Outcome::is_in_progress);
            let successes: Vec<i64> = outcomes.iter().filter_map(|o| o.success().copied()).collect();

            let combined = Outcome::combine(outcomes);
            match (first_error, any_pending) {
                (Some(failure), _) => prop_assert_eq!(combined, Outcome::Error(failure)),
                (None, true) => prop_assert_eq!(combined, Outcome::InProgress),
                (None, false) => prop_assert_eq!(combined, Outcome::Success(successes)),
            }
        }
    }
}
