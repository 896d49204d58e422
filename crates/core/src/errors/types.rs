//! Core failure type definitions

use serde::{Deserialize, Serialize};

/// Result type alias for tether operations that do not produce an `Outcome`
pub type Result<T> = std::result::Result<T, Failure>;

/// Closed taxonomy of every failure the core can report.
///
/// Each category wraps its own enum of concrete cases. A failure is always
/// exactly one case; the retry and user-facing policies are looked up from
/// the tables in `policy.rs` using [`FailureKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "category", content = "case", rename_all = "snake_case")]
pub enum Failure {
    #[error("network failure: {0}")]
    Network(#[from] NetworkFailure),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageFailure),

    #[error("validation failure: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("concurrency failure: {0}")]
    Concurrency(#[from] ConcurrencyFailure),

    #[error("security failure: {0}")]
    Security(#[from] SecurityFailure),

    #[error("configuration failure: {0}")]
    Configuration(#[from] ConfigurationFailure),

    #[error("unknown failure: {message}")]
    Unknown { message: String },
}

/// Failures talking to a remote data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailure {
    #[error("no network connection")]
    NoConnection,

    /// `timeout_ms` is 0 when the transport did not report a limit
    #[error("request timed out{}", elapsed_suffix(.timeout_ms))]
    Timeout { timeout_ms: u64 },

    #[error("server responded with {status_code}: {body}")]
    ServerError { status_code: u16, body: String },

    #[error("request rejected with {status_code}: {body}")]
    ClientError { status_code: u16, body: String },

    #[error("could not parse response: {detail}")]
    ParseError { detail: String },
}

fn elapsed_suffix(timeout_ms: &u64) -> String {
    if *timeout_ms == 0 {
        String::new()
    } else {
        format!(" after {timeout_ms}ms")
    }
}

/// Failures reading or writing local persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum StorageFailure {
    #[error("database operation '{operation}' failed: {detail}")]
    DatabaseError { operation: String, detail: String },

    #[error("insufficient storage space")]
    InsufficientSpace,

    #[error("permission denied for '{path}'")]
    PermissionDenied { path: String },

    #[error("cache operation '{operation}' failed")]
    CacheError { operation: String },
}

/// Domain and business rule violations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("invalid value for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("rule '{rule}' violated: {detail}")]
    RuleViolation { rule: String, detail: String },
}

/// Failures produced by the concurrency-control primitives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyFailure {
    #[error("operation '{name}' was cancelled")]
    OperationCancelled { name: String },

    #[error("deadlock detected: {detail}")]
    Deadlock { detail: String },

    #[error("circuit breaker is open: {detail}")]
    CircuitOpen { detail: String },

    #[error("timed out: {detail}")]
    Timeout { detail: String },

    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Authentication, authorization and integrity failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SecurityFailure {
    #[error("not authenticated: {detail}")]
    Unauthenticated { detail: String },

    #[error("access to '{resource}' is forbidden")]
    Forbidden { resource: String },

    #[error("integrity check failed: {detail}")]
    IntegrityViolation { detail: String },
}

/// Setup failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationFailure {
    #[error("missing configuration value '{key}'")]
    Missing { key: String },

    #[error("invalid configuration value '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Fieldless identifier for every concrete failure case.
///
/// Policy tables are keyed on this so that they stay plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    NetworkNoConnection,
    NetworkTimeout,
    NetworkServerError,
    NetworkClientError,
    NetworkParseError,
    StorageDatabaseError,
    StorageInsufficientSpace,
    StoragePermissionDenied,
    StorageCacheError,
    ValidationInvalidInput,
    ValidationRuleViolation,
    ConcurrencyOperationCancelled,
    ConcurrencyDeadlock,
    ConcurrencyCircuitOpen,
    ConcurrencyTimeout,
    ConcurrencyRetriesExhausted,
    SecurityUnauthenticated,
    SecurityForbidden,
    SecurityIntegrityViolation,
    ConfigurationMissing,
    ConfigurationInvalid,
    Unknown,
}

impl FailureKind {
    /// Every kind, in declaration order
    pub const ALL: [FailureKind; 22] = [
        FailureKind::NetworkNoConnection,
        FailureKind::NetworkTimeout,
        FailureKind::NetworkServerError,
        FailureKind::NetworkClientError,
        FailureKind::NetworkParseError,
        FailureKind::StorageDatabaseError,
        FailureKind::StorageInsufficientSpace,
        FailureKind::StoragePermissionDenied,
        FailureKind::StorageCacheError,
        FailureKind::ValidationInvalidInput,
        FailureKind::ValidationRuleViolation,
        FailureKind::ConcurrencyOperationCancelled,
        FailureKind::ConcurrencyDeadlock,
        FailureKind::ConcurrencyCircuitOpen,
        FailureKind::ConcurrencyTimeout,
        FailureKind::ConcurrencyRetriesExhausted,
        FailureKind::SecurityUnauthenticated,
        FailureKind::SecurityForbidden,
        FailureKind::SecurityIntegrityViolation,
        FailureKind::ConfigurationMissing,
        FailureKind::ConfigurationInvalid,
        FailureKind::Unknown,
    ];

    /// Category tag used for observability
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::NetworkNoConnection
            | Self::NetworkTimeout
            | Self::NetworkServerError
            | Self::NetworkClientError
            | Self::NetworkParseError => "network",
            Self::StorageDatabaseError
            | Self::StorageInsufficientSpace
            | Self::StoragePermissionDenied
            | Self::StorageCacheError => "storage",
            Self::ValidationInvalidInput | Self::ValidationRuleViolation => "validation",
            Self::ConcurrencyOperationCancelled
            | Self::ConcurrencyDeadlock
            | Self::ConcurrencyCircuitOpen
            | Self::ConcurrencyTimeout
            | Self::ConcurrencyRetriesExhausted => "concurrency",
            Self::SecurityUnauthenticated
            | Self::SecurityForbidden
            | Self::SecurityIntegrityViolation => "security",
            Self::ConfigurationMissing | Self::ConfigurationInvalid => "configuration",
            Self::Unknown => "unknown",
        }
    }

    /// Stable dotted code, e.g. `network.timeout`
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NetworkNoConnection => "network.no_connection",
            Self::NetworkTimeout => "network.timeout",
            Self::NetworkServerError => "network.server_error",
            Self::NetworkClientError => "network.client_error",
            Self::NetworkParseError => "network.parse_error",
            Self::StorageDatabaseError => "storage.database_error",
            Self::StorageInsufficientSpace => "storage.insufficient_space",
            Self::StoragePermissionDenied => "storage.permission_denied",
            Self::StorageCacheError => "storage.cache_error",
            Self::ValidationInvalidInput => "validation.invalid_input",
            Self::ValidationRuleViolation => "validation.rule_violation",
            Self::ConcurrencyOperationCancelled => "concurrency.operation_cancelled",
            Self::ConcurrencyDeadlock => "concurrency.deadlock",
            Self::ConcurrencyCircuitOpen => "concurrency.circuit_open",
            Self::ConcurrencyTimeout => "concurrency.timeout",
            Self::ConcurrencyRetriesExhausted => "concurrency.retries_exhausted",
            Self::SecurityUnauthenticated => "security.unauthenticated",
            Self::SecurityForbidden => "security.forbidden",
            Self::SecurityIntegrityViolation => "security.integrity_violation",
            Self::ConfigurationMissing => "configuration.missing",
            Self::ConfigurationInvalid => "configuration.invalid",
            Self::Unknown => "unknown",
        }
    }
}

impl Failure {
    /// The concrete case this failure represents
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Failure::Network(case) => match case {
                NetworkFailure::NoConnection => FailureKind::NetworkNoConnection,
                NetworkFailure::Timeout { .. } => FailureKind::NetworkTimeout,
                NetworkFailure::ServerError { .. } => FailureKind::NetworkServerError,
                NetworkFailure::ClientError { .. } => FailureKind::NetworkClientError,
                NetworkFailure::ParseError { .. } => FailureKind::NetworkParseError,
            },
            Failure::Storage(case) => match case {
                StorageFailure::DatabaseError { .. } => FailureKind::StorageDatabaseError,
                StorageFailure::InsufficientSpace => FailureKind::StorageInsufficientSpace,
                StorageFailure::PermissionDenied { .. } => FailureKind::StoragePermissionDenied,
                StorageFailure::CacheError { .. } => FailureKind::StorageCacheError,
            },
            Failure::Validation(case) => match case {
                ValidationFailure::InvalidInput { .. } => FailureKind::ValidationInvalidInput,
                ValidationFailure::RuleViolation { .. } => FailureKind::ValidationRuleViolation,
            },
            Failure::Concurrency(case) => match case {
                ConcurrencyFailure::OperationCancelled { .. } => {
                    FailureKind::ConcurrencyOperationCancelled
                }
                ConcurrencyFailure::Deadlock { .. } => FailureKind::ConcurrencyDeadlock,
                ConcurrencyFailure::CircuitOpen { .. } => FailureKind::ConcurrencyCircuitOpen,
                ConcurrencyFailure::Timeout { .. } => FailureKind::ConcurrencyTimeout,
                ConcurrencyFailure::RetriesExhausted { .. } => {
                    FailureKind::ConcurrencyRetriesExhausted
                }
            },
            Failure::Security(case) => match case {
                SecurityFailure::Unauthenticated { .. } => FailureKind::SecurityUnauthenticated,
                SecurityFailure::Forbidden { .. } => FailureKind::SecurityForbidden,
                SecurityFailure::IntegrityViolation { .. } => {
                    FailureKind::SecurityIntegrityViolation
                }
            },
            Failure::Configuration(case) => match case {
                ConfigurationFailure::Missing { .. } => FailureKind::ConfigurationMissing,
                ConfigurationFailure::Invalid { .. } => FailureKind::ConfigurationInvalid,
            },
            Failure::Unknown { .. } => FailureKind::Unknown,
        }
    }

    /// Category tag used for observability (`network`, `storage`, ...)
    #[must_use]
    pub const fn category(&self) -> &'static str {
        self.kind().category()
    }

    /// Stable dotted code for this case
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }
}
