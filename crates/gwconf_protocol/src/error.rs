//! Error types for the protocol crate.

use gwconf_codec::CodecError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A target string could not be resolved to a transport address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The target does not use a supported `scheme://` form.
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget {
        /// The target string as given.
        target: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl TargetError {
    /// Create an invalid target error.
    pub fn invalid(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while framing or decoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A message body could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reading or writing a frame failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame exceeds the configured size limit.
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Claimed frame size.
        size: usize,
        /// Maximum accepted size.
        max: usize,
    },

    /// A frame header declares a length too short to hold its tag.
    #[error("empty frame")]
    EmptyFrame,

    /// A request names a method this protocol does not define.
    #[error("unknown method {0}")]
    UnknownMethod(u8),

    /// A response carries a status code this protocol does not define.
    #[error("unknown status code {0}")]
    UnknownStatus(u8),

    /// A message body is well-formed CBOR but not the expected message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Create an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }

    /// Returns true if the error came from the underlying connection.
    pub fn is_io(&self) -> bool {
        matches!(self, ProtocolError::Io(_))
    }
}
