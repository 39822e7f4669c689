//! Error types for the config server.

use gwconf_protocol::{ProtocolError, TargetError};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the config server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listen target could not be resolved.
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    /// Binding the listening socket failed.
    #[error("failed to listen on {target}: {source}")]
    Bind {
        /// Target being bound.
        target: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stale Unix socket could not be removed.
    #[error("failed to remove existing unix socket {path}: {source}")]
    StaleSocket {
        /// Socket path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A connection failed at the protocol level.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if the error happened before the server started serving.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidTarget(_) | ServerError::Bind { .. } | ServerError::StaleSocket { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        let bind = ServerError::Bind {
            target: "tcp://:1".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(bind.is_startup_error());
        assert!(!ServerError::Internal("oops".into()).is_startup_error());
    }

    #[test]
    fn error_display_names_target() {
        let err = ServerError::Bind {
            target: "unix:///run/dp.sock".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("unix:///run/dp.sock"));
    }
}
