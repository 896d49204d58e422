//! Conversions from foreign error types into `Failure`

use super::types::Failure;
use std::io::ErrorKind;

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::PermissionDenied => Failure::permission_denied(error.to_string()),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrNotAvailable
            | ErrorKind::BrokenPipe => Failure::no_connection(),
            ErrorKind::TimedOut => Failure::network_timeout(0),
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => {
                Failure::parse_error(error.to_string())
            }
            ErrorKind::Interrupted => Failure::cancelled("io"),
            _ => Failure::unknown(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            Failure::unknown(error.to_string())
        } else {
            Failure::parse_error(error.to_string())
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // Keep an already-typed failure intact if one is at the root
        match error.downcast::<Failure>() {
            Ok(failure) => failure,
            Err(error) => Failure::unknown(format!("{error:#}")),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Failure {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        Failure::timeout(error.to_string())
    }
}

impl From<tokio::task::JoinError> for Failure {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Failure::cancelled("task")
        } else {
            Failure::unknown(format!("task panicked: {error}"))
        }
    }
}
