//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
///
/// The first group is produced by the YAML document codec, the second by
/// the CBOR wire codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value.
    ///
    /// Well-formed in-memory values never produce this; seeing it means the
    /// value tree does not match the schema it is being encoded against.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// A document names a field the schema does not know.
    #[error("unknown field `{path}`")]
    UnknownField {
        /// Dotted path of the offending field.
        path: String,
    },

    /// The document text is not well-formed.
    #[error("malformed document: {message}")]
    MalformedSyntax {
        /// Description of the syntax error.
        message: String,
    },

    /// A field holds a value of the wrong kind.
    #[error("type mismatch at `{path}`: expected {expected}")]
    TypeMismatch {
        /// Dotted path of the offending field.
        path: String,
        /// What the schema expects at this position.
        expected: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// Float values are forbidden in canonical CBOR.
    #[error("float values are forbidden in canonical CBOR")]
    FloatForbidden,

    /// Indefinite-length items are forbidden.
    #[error("indefinite-length items are forbidden")]
    IndefiniteLengthForbidden,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Invalid CBOR structure.
    #[error("invalid CBOR structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Unsupported CBOR type.
    #[error("unsupported CBOR type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A length prefix exceeds the decoder's limits.
    #[error("size limit exceeded: claimed {claimed}, max {max_allowed}")]
    SizeLimitExceeded {
        /// Length claimed by the input.
        claimed: u64,
        /// Maximum length accepted.
        max_allowed: u64,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField { path: path.into() }
    }

    /// Create a malformed syntax error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSyntax {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Returns true if this error rejects an operator-supplied document.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            CodecError::UnknownField { .. }
                | CodecError::MalformedSyntax { .. }
                | CodecError::TypeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_classification() {
        assert!(CodecError::unknown_field("underlay.bogus").is_document_error());
        assert!(CodecError::malformed("bad indent").is_document_error());
        assert!(CodecError::type_mismatch("generation", "uint64").is_document_error());
        assert!(!CodecError::encoding_failed("oops").is_document_error());
        assert!(!CodecError::UnexpectedEof.is_document_error());
    }

    #[test]
    fn error_display_names_path() {
        let err = CodecError::unknown_field("underlay.vrf[0].bogus");
        assert_eq!(err.to_string(), "unknown field `underlay.vrf[0].bogus`");

        let err = CodecError::type_mismatch("generation", "uint64");
        assert!(err.to_string().contains("generation"));
        assert!(err.to_string().contains("uint64"));
    }
}
