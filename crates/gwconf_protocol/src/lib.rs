//! # gwconf protocol
//!
//! Shared contract between config service clients and servers.
//!
//! This crate provides:
//! - [`TransportAddress`] resolution from `tcp://` and `unix://` targets
//! - [`ConfigDocument`], the versioned configuration entity, and
//!   [`DocumentCodec`], its strict YAML text form
//! - the gateway configuration schema used by the text codec
//! - RPC messages for `GetConfig`, `GetConfigGeneration` and `UpdateConfig`
//! - length-prefixed [`Frame`]s and async frame I/O
//!
//! Apart from frame I/O over a caller-supplied stream, this crate performs
//! no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod frame;
mod messages;
pub mod schema;
mod target;

pub use document::{ConfigDocument, DocumentCodec};
pub use error::{ProtocolError, ProtocolResult, TargetError};
pub use frame::{read_frame, write_frame, Frame, MAX_FRAME_SIZE};
pub use messages::{
    decode_status_message, encode_status_message, ErrorCode, GetConfigGenerationRequest,
    GetConfigGenerationResponse, GetConfigRequest, Method, RpcRequest, RpcResponse, StatusCode,
    UpdateConfigRequest, UpdateConfigResponse,
};
pub use target::{resolve, TransportAddress, TransportKind};
