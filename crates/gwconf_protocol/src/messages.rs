//! Protocol messages for config sync.
//!
//! Every message body is a canonical CBOR map. Request bodies for the two
//! read operations are empty maps.

use std::fmt;

use gwconf_codec::{from_cbor, to_canonical_cbor, CodecError, CodecResult, Value};

use crate::document::ConfigDocument;
use crate::error::{ProtocolError, ProtocolResult};

/// An RPC method. The discriminant is the request frame tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Fetch the current document.
    GetConfig = 1,
    /// Fetch only the generation counter.
    GetConfigGeneration = 2,
    /// Replace the document.
    UpdateConfig = 3,
}

impl Method {
    /// Returns the request frame tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up a method by frame tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Method::GetConfig),
            2 => Some(Method::GetConfigGeneration),
            3 => Some(Method::UpdateConfig),
            _ => None,
        }
    }

    /// Operation name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Method::GetConfig => "GetConfig",
            Method::GetConfigGeneration => "GetConfigGeneration",
            Method::UpdateConfig => "UpdateConfig",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RPC status carried as the response frame tag.
///
/// Numbering follows the gRPC status codes so logs read the same as for
/// other dataplane services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The call succeeded.
    Ok = 0,
    /// The request body could not be decoded.
    InvalidArgument = 3,
    /// The deadline passed before a response arrived.
    DeadlineExceeded = 4,
    /// The method is not served.
    Unimplemented = 12,
    /// The server failed while handling the call.
    Internal = 13,
    /// The server could not be reached.
    Unavailable = 14,
}

impl StatusCode {
    /// Returns the response frame tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up a status by frame tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(StatusCode::Ok),
            3 => Some(StatusCode::InvalidArgument),
            4 => Some(StatusCode::DeadlineExceeded),
            12 => Some(StatusCode::Unimplemented),
            13 => Some(StatusCode::Internal),
            14 => Some(StatusCode::Unavailable),
            _ => None,
        }
    }

    /// Returns true for [`StatusCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::InvalidArgument => "InvalidArgument",
            StatusCode::DeadlineExceeded => "DeadlineExceeded",
            StatusCode::Unimplemented => "Unimplemented",
            StatusCode::Internal => "Internal",
            StatusCode::Unavailable => "Unavailable",
        };
        f.write_str(name)
    }
}

/// Application-level outcome of an update.
///
/// Distinct from [`StatusCode`]: an update can be delivered fine (`Ok`)
/// and still be refused by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// The update was applied.
    #[default]
    None = 0,
    /// The document was rejected before applying.
    ValidationFailed = 1,
    /// Applying the document failed.
    ApplyFailed = 2,
    /// Any other failure, including codes this build does not know.
    Unknown = 3,
}

impl ErrorCode {
    /// Numeric value on the wire.
    pub fn number(self) -> i64 {
        self as i64
    }

    /// Maps a wire number to a code. Unrecognised numbers become
    /// [`ErrorCode::Unknown`].
    pub fn from_number(n: i64) -> Self {
        match n {
            0 => ErrorCode::None,
            1 => ErrorCode::ValidationFailed,
            2 => ErrorCode::ApplyFailed,
            _ => ErrorCode::Unknown,
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::None => "ERROR_NONE",
            ErrorCode::ValidationFailed => "ERROR_VALIDATION_FAILED",
            ErrorCode::ApplyFailed => "ERROR_APPLY_FAILED",
            ErrorCode::Unknown => "ERROR_UNKNOWN",
        }
    }

    /// Returns true for [`ErrorCode::None`].
    pub fn is_none(self) -> bool {
        self == ErrorCode::None
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn expect_map<'a>(value: &'a Value, what: &str) -> CodecResult<&'a [(Value, Value)]> {
    value
        .as_map()
        .ok_or_else(|| CodecError::invalid_structure(format!("{what}: expected map")))
}

/// Request for [`Method::GetConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetConfigRequest;

/// Request for [`Method::GetConfigGeneration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetConfigGenerationRequest;

/// Response to [`Method::GetConfigGeneration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetConfigGenerationResponse {
    /// Current generation.
    pub generation: u64,
}

impl GetConfigGenerationResponse {
    /// Encodes to CBOR.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::map(vec![(
            Value::from("generation"),
            Value::from(self.generation),
        )]))
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let value = from_cbor(bytes)?;
        expect_map(&value, "GetConfigGenerationResponse")?;
        let generation = value
            .get("generation")
            .and_then(Value::as_u64)
            .ok_or_else(|| CodecError::invalid_structure("missing generation"))?;
        Ok(Self { generation })
    }
}

/// Request for [`Method::UpdateConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfigRequest {
    /// Document replacing the current one.
    pub config: ConfigDocument,
}

impl UpdateConfigRequest {
    /// Encodes to CBOR.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::map(vec![(
            Value::from("config"),
            self.config.to_value(),
        )]))
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let value = from_cbor(bytes)?;
        expect_map(&value, "UpdateConfigRequest")?;
        let config = value
            .get("config")
            .ok_or_else(|| CodecError::invalid_structure("missing config"))
            .and_then(ConfigDocument::from_value)?;
        Ok(Self { config })
    }
}

/// Response to [`Method::UpdateConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateConfigResponse {
    /// Outcome of the update.
    pub error: ErrorCode,
    /// Human-readable detail, usually empty on success.
    pub message: String,
}

impl UpdateConfigResponse {
    /// A successful response.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A failed response.
    pub fn failed(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::map(vec![
            (Value::from("error"), Value::Integer(self.error.number())),
            (Value::from("message"), Value::from(self.message.as_str())),
        ]))
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let value = from_cbor(bytes)?;
        expect_map(&value, "UpdateConfigResponse")?;
        let error = value
            .get("error")
            .and_then(Value::as_integer)
            .map_or(ErrorCode::None, ErrorCode::from_number);
        let message = value
            .get("message")
            .and_then(Value::as_text)
            .unwrap_or_default()
            .to_string();
        Ok(Self { error, message })
    }
}

/// A request as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcRequest {
    /// Fetch the document.
    GetConfig(GetConfigRequest),
    /// Fetch the generation.
    GetConfigGeneration(GetConfigGenerationRequest),
    /// Replace the document.
    UpdateConfig(UpdateConfigRequest),
}

impl RpcRequest {
    /// Method invoked by this request.
    pub fn method(&self) -> Method {
        match self {
            RpcRequest::GetConfig(_) => Method::GetConfig,
            RpcRequest::GetConfigGeneration(_) => Method::GetConfigGeneration,
            RpcRequest::UpdateConfig(_) => Method::UpdateConfig,
        }
    }

    /// Encodes the request body.
    pub fn encode_body(&self) -> CodecResult<Vec<u8>> {
        match self {
            RpcRequest::GetConfig(_) | RpcRequest::GetConfigGeneration(_) => {
                to_canonical_cbor(&Value::empty_map())
            }
            RpcRequest::UpdateConfig(req) => req.encode(),
        }
    }

    /// Decodes a request body for the given method.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Codec`] if the body is not valid for the
    /// method.
    pub fn decode(method: Method, body: &[u8]) -> ProtocolResult<Self> {
        let request = match method {
            Method::GetConfig => {
                expect_map(&from_cbor(body)?, "GetConfigRequest")?;
                RpcRequest::GetConfig(GetConfigRequest)
            }
            Method::GetConfigGeneration => {
                expect_map(&from_cbor(body)?, "GetConfigGenerationRequest")?;
                RpcRequest::GetConfigGeneration(GetConfigGenerationRequest)
            }
            Method::UpdateConfig => RpcRequest::UpdateConfig(UpdateConfigRequest::decode(body)?),
        };
        Ok(request)
    }
}

/// A successful response as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcResponse {
    /// Answer to [`Method::GetConfig`].
    Config(ConfigDocument),
    /// Answer to [`Method::GetConfigGeneration`].
    Generation(GetConfigGenerationResponse),
    /// Answer to [`Method::UpdateConfig`].
    Update(UpdateConfigResponse),
}

impl RpcResponse {
    /// Method this response answers.
    pub fn method(&self) -> Method {
        match self {
            RpcResponse::Config(_) => Method::GetConfig,
            RpcResponse::Generation(_) => Method::GetConfigGeneration,
            RpcResponse::Update(_) => Method::UpdateConfig,
        }
    }

    /// Encodes the response body.
    pub fn encode_body(&self) -> CodecResult<Vec<u8>> {
        match self {
            RpcResponse::Config(doc) => to_canonical_cbor(&doc.to_value()),
            RpcResponse::Generation(resp) => resp.encode(),
            RpcResponse::Update(resp) => resp.encode(),
        }
    }

    /// Decodes a response body for the method that was called.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Codec`] if the body does not match the
    /// method's response.
    pub fn decode(method: Method, body: &[u8]) -> ProtocolResult<Self> {
        let response = match method {
            Method::GetConfig => {
                RpcResponse::Config(ConfigDocument::from_value(&from_cbor(body)?)?)
            }
            Method::GetConfigGeneration => {
                RpcResponse::Generation(GetConfigGenerationResponse::decode(body)?)
            }
            Method::UpdateConfig => RpcResponse::Update(UpdateConfigResponse::decode(body)?),
        };
        Ok(response)
    }
}

/// Encodes the text message carried by a non-`Ok` response.
pub fn encode_status_message(message: &str) -> CodecResult<Vec<u8>> {
    to_canonical_cbor(&Value::from(message))
}

/// Decodes the text message carried by a non-`Ok` response.
///
/// Bodies that are not a CBOR text string yield an empty message.
pub fn decode_status_message(body: &[u8]) -> String {
    match from_cbor(body) {
        Ok(Value::Text(message)) => message,
        _ => String::new(),
    }
}

impl From<ProtocolError> for StatusCode {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Codec(_) | ProtocolError::InvalidMessage(_) => {
                StatusCode::InvalidArgument
            }
            ProtocolError::UnknownMethod(_) => StatusCode::Unimplemented,
            _ => StatusCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_tags() {
        for method in [
            Method::GetConfig,
            Method::GetConfigGeneration,
            Method::UpdateConfig,
        ] {
            assert_eq!(Method::from_tag(method.tag()), Some(method));
        }
        assert_eq!(Method::from_tag(0), None);
        assert_eq!(Method::from_tag(4), None);
        assert_eq!(Method::UpdateConfig.to_string(), "UpdateConfig");
    }

    #[test]
    fn status_tags_follow_grpc_numbering() {
        assert_eq!(StatusCode::Ok.tag(), 0);
        assert_eq!(StatusCode::DeadlineExceeded.tag(), 4);
        assert_eq!(StatusCode::Unavailable.tag(), 14);
        assert_eq!(StatusCode::from_tag(12), Some(StatusCode::Unimplemented));
        assert_eq!(StatusCode::from_tag(1), None);
    }

    #[test]
    fn unknown_error_numbers_map_to_unknown() {
        assert_eq!(ErrorCode::from_number(0), ErrorCode::None);
        assert_eq!(ErrorCode::from_number(2), ErrorCode::ApplyFailed);
        assert_eq!(ErrorCode::from_number(99), ErrorCode::Unknown);
        assert_eq!(ErrorCode::None.to_string(), "ERROR_NONE");
    }

    #[test]
    fn update_request_roundtrip() {
        let payload = Value::map(vec![(
            Value::from("device"),
            Value::map(vec![(Value::from("hostname"), Value::from("gw1"))]),
        )]);
        let request = RpcRequest::UpdateConfig(UpdateConfigRequest {
            config: ConfigDocument::new(42, payload),
        });

        let body = request.encode_body().unwrap();
        let decoded = RpcRequest::decode(Method::UpdateConfig, &body).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn update_response_roundtrip() {
        let response = UpdateConfigResponse::failed(ErrorCode::ValidationFailed, "stale generation");
        let decoded = UpdateConfigResponse::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn empty_request_bodies() {
        let body = RpcRequest::GetConfig(GetConfigRequest).encode_body().unwrap();
        assert_eq!(body, vec![0xa0]);
        assert!(RpcRequest::decode(Method::GetConfigGeneration, &body).is_ok());
        assert!(RpcRequest::decode(Method::GetConfig, &[0x01]).is_err());
        assert!(RpcRequest::decode(Method::UpdateConfig, &body).is_err());
    }

    #[test]
    fn response_decoding_depends_on_method() {
        let response = RpcResponse::Generation(GetConfigGenerationResponse { generation: 42 });
        let body = response.encode_body().unwrap();
        assert_eq!(
            RpcResponse::decode(Method::GetConfigGeneration, &body).unwrap(),
            response
        );
        assert!(RpcResponse::decode(Method::GetConfig, &body).is_err());
    }

    #[test]
    fn status_message_roundtrip() {
        let body = encode_status_message("unknown method 9").unwrap();
        assert_eq!(decode_status_message(&body), "unknown method 9");
        assert_eq!(decode_status_message(&[0xff]), "");
    }
}
