//! Retry and user-facing policy tables.
//!
//! Both tables are allow-lists: a kind that does not appear with `true` is
//! treated as `false`. New failure cases are therefore never retried or shown
//! to users until they are added here explicitly.

use super::types::{Failure, FailureKind};

/// Authoritative retryability table
pub const RETRYABILITY: &[(FailureKind, bool)] = &[
    (FailureKind::NetworkNoConnection, true),
    (FailureKind::NetworkTimeout, true),
    (FailureKind::NetworkServerError, true),
    (FailureKind::NetworkClientError, false),
    (FailureKind::StorageInsufficientSpace, false),
    (FailureKind::StoragePermissionDenied, false),
    (FailureKind::ConcurrencyCircuitOpen, false),
];

/// Kinds whose message is meaningful to an end user
pub const USER_FACING: &[(FailureKind, bool)] = &[
    (FailureKind::NetworkNoConnection, true),
    (FailureKind::NetworkTimeout, true),
    (FailureKind::NetworkServerError, true),
    (FailureKind::NetworkClientError, true),
    (FailureKind::StorageInsufficientSpace, true),
    (FailureKind::StoragePermissionDenied, true),
    (FailureKind::ValidationInvalidInput, true),
    (FailureKind::ValidationRuleViolation, true),
    (FailureKind::ConcurrencyCircuitOpen, true),
    (FailureKind::ConcurrencyTimeout, true),
    (FailureKind::SecurityUnauthenticated, true),
    (FailureKind::SecurityForbidden, true),
];

fn lookup(table: &[(FailureKind, bool)], kind: FailureKind) -> bool {
    table
        .iter()
        .find(|(entry, _)| *entry == kind)
        .is_some_and(|(_, flag)| *flag)
}

impl FailureKind {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        lookup(RETRYABILITY, self)
    }

    #[must_use]
    pub fn is_user_facing(self) -> bool {
        lookup(USER_FACING, self)
    }
}

impl Failure {
    /// Whether a retry controller may attempt the operation again
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Whether collaborators should surface this failure to the user
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        self.kind().is_user_facing()
    }
}
