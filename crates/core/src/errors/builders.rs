//! Builder methods for creating failures with context

use super::types::{
    ConcurrencyFailure, ConfigurationFailure, Failure, NetworkFailure, SecurityFailure,
    StorageFailure, ValidationFailure,
};

// Helper methods for creating failures with context
impl Failure {
    /// Create a failure for an unreachable remote
    #[must_use]
    pub fn no_connection() -> Self {
        Failure::Network(NetworkFailure::NoConnection)
    }

    /// Create a network timeout failure
    #[must_use]
    pub fn network_timeout(timeout_ms: u64) -> Self {
        Failure::Network(NetworkFailure::Timeout { timeout_ms })
    }

    /// Create a 5xx-style server failure
    #[must_use]
    pub fn server_error(status_code: u16, body: impl Into<String>) -> Self {
        Failure::Network(NetworkFailure::ServerError {
            status_code,
            body: body.into(),
        })
    }

    /// Create a 4xx-style client failure
    #[must_use]
    pub fn client_error(status_code: u16, body: impl Into<String>) -> Self {
        Failure::Network(NetworkFailure::ClientError {
            status_code,
            body: body.into(),
        })
    }

    /// Create an HTTP failure, classified by status code
    #[must_use]
    pub fn http_status(status_code: u16, body: impl Into<String>) -> Self {
        if status_code >= 500 {
            Self::server_error(status_code, body)
        } else {
            Self::client_error(status_code, body)
        }
    }

    /// Create a failure for an undecodable response
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Failure::Network(NetworkFailure::ParseError {
            detail: detail.into(),
        })
    }

    /// Create a database failure
    #[must_use]
    pub fn database_error(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Failure::Storage(StorageFailure::DatabaseError {
            operation: operation.into(),
            detail: detail.into(),
        })
    }

    /// Create a failure for a full disk
    #[must_use]
    pub fn insufficient_space() -> Self {
        Failure::Storage(StorageFailure::InsufficientSpace)
    }

    /// Create a failure for an inaccessible path
    #[must_use]
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Failure::Storage(StorageFailure::PermissionDenied { path: path.into() })
    }

    /// Create a cache store failure
    #[must_use]
    pub fn cache_error(operation: impl Into<String>) -> Self {
        Failure::Storage(StorageFailure::CacheError {
            operation: operation.into(),
        })
    }

    /// Create a failure for a rejected input field
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Failure::Validation(ValidationFailure::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Create a failure for a broken business rule
    #[must_use]
    pub fn rule_violation(rule: impl Into<String>, detail: impl Into<String>) -> Self {
        Failure::Validation(ValidationFailure::RuleViolation {
            rule: rule.into(),
            detail: detail.into(),
        })
    }

    /// Create a cancellation failure for the named operation
    #[must_use]
    pub fn cancelled(name: impl Into<String>) -> Self {
        Failure::Concurrency(ConcurrencyFailure::OperationCancelled { name: name.into() })
    }

    /// Create a failure for operations waiting on each other
    #[must_use]
    pub fn deadlock(detail: impl Into<String>) -> Self {
        Failure::Concurrency(ConcurrencyFailure::Deadlock {
            detail: detail.into(),
        })
    }

    /// Create the rejection returned by an open circuit breaker
    #[must_use]
    pub fn circuit_open(detail: impl Into<String>) -> Self {
        Failure::Concurrency(ConcurrencyFailure::CircuitOpen {
            detail: detail.into(),
        })
    }

    /// Create a concurrency timeout failure
    #[must_use]
    pub fn timeout(detail: impl Into<String>) -> Self {
        Failure::Concurrency(ConcurrencyFailure::Timeout {
            detail: detail.into(),
        })
    }

    /// Create the failure for a retry budget that ran out
    #[must_use]
    pub fn retries_exhausted(attempts: u32) -> Self {
        Failure::Concurrency(ConcurrencyFailure::RetriesExhausted { attempts })
    }

    /// Create a failure for missing or expired credentials
    #[must_use]
    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Failure::Security(SecurityFailure::Unauthenticated {
            detail: detail.into(),
        })
    }

    /// Create a failure for a resource the caller may not access
    #[must_use]
    pub fn forbidden(resource: impl Into<String>) -> Self {
        Failure::Security(SecurityFailure::Forbidden {
            resource: resource.into(),
        })
    }

    /// Create a failure for tampered or inconsistent data
    #[must_use]
    pub fn integrity_violation(detail: impl Into<String>) -> Self {
        Failure::Security(SecurityFailure::IntegrityViolation {
            detail: detail.into(),
        })
    }

    /// Create a missing configuration failure
    #[must_use]
    pub fn missing_config(key: impl Into<String>) -> Self {
        Failure::Configuration(ConfigurationFailure::Missing { key: key.into() })
    }

    /// Create an invalid configuration failure
    #[must_use]
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Failure::Configuration(ConfigurationFailure::Invalid {
            key: key.into(),
            reason: reason.into(),
        })
    }

    /// Create a failure for a condition that matches no other case
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Failure::Unknown {
            message: message.into(),
        }
    }
}
