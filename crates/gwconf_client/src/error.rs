//! Error types for the config client.

use std::time::Duration;

use gwconf_codec::CodecError;
use gwconf_protocol::{ErrorCode, ProtocolError, StatusCode, TargetError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur when talking to a config server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The target string could not be resolved.
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    /// Dialing or talking to the server failed.
    #[error("transport error for {target}: {source}")]
    Transport {
        /// Target being dialed.
        target: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The call did not complete before its deadline.
    #[error("{operation} did not complete within {timeout:?}")]
    DeadlineExceeded {
        /// RPC name.
        operation: &'static str,
        /// Deadline that expired.
        timeout: Duration,
    },

    /// The server answered with a non-`OK` status.
    #[error("{operation} failed with status {status}: {message}")]
    Status {
        /// RPC name.
        operation: &'static str,
        /// Status returned.
        status: StatusCode,
        /// Message returned.
        message: String,
    },

    /// A document could not be decoded.
    #[error("failed to decode config: {0}")]
    Decode(#[from] CodecError),

    /// The response was malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server reported a failed update.
    #[error("update failed ({code}): {message}")]
    Application {
        /// Error code returned.
        code: ErrorCode,
        /// Message returned.
        message: String,
    },

    /// A local file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File or stream involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Returns the RPC status this error corresponds to, if it came from the
    /// call itself.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::DeadlineExceeded { .. } => Some(StatusCode::DeadlineExceeded),
            ClientError::Transport { .. } => Some(StatusCode::Unavailable),
            _ => None,
        }
    }

    /// Returns true if the server could not be reached or the call timed out.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport { .. } | ClientError::DeadlineExceeded { .. }
        )
    }

    /// Returns true if a document failed to decode.
    pub fn is_decode_error(&self) -> bool {
        match self {
            ClientError::Decode(e) => e.is_document_error(),
            _ => false,
        }
    }

    pub(crate) fn transport(target: impl Into<String>, source: std::io::Error) -> Self {
        ClientError::Transport {
            target: target.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let err = ClientError::DeadlineExceeded {
            operation: "GetConfig",
            timeout: Duration::from_secs(5),
        };
        assert!(err.is_transport());
        assert_eq!(err.status_code(), Some(StatusCode::DeadlineExceeded));

        let err = ClientError::Application {
            code: ErrorCode::ApplyFailed,
            message: "boom".to_string(),
        };
        assert!(!err.is_transport());
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn transport_error_names_target() {
        let err = ClientError::transport(
            "tcp://:1",
            std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        );
        assert!(err.to_string().starts_with("transport error for tcp://:1"));
        assert_eq!(err.status_code(), Some(StatusCode::Unavailable));
    }
}
