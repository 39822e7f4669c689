//! Length-prefixed frames.
//!
//! ```text
//! +----------------+-------+---------------------+
//! | length: u32 BE | tag   | body (CBOR)         |
//! +----------------+-------+---------------------+
//!                  |<------- length bytes ------>|
//! ```
//!
//! The tag is a [`Method`] on requests and a [`StatusCode`] on responses.
//! The same framing is used over TCP and Unix sockets.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{
    decode_status_message, encode_status_message, Method, RpcRequest, RpcResponse, StatusCode,
};

/// Largest frame accepted by default (16 MiB, tag included).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Method or status tag.
    pub tag: u8,
    /// CBOR body.
    pub body: Bytes,
}

impl Frame {
    /// Creates a frame.
    pub fn new(tag: u8, body: impl Into<Bytes>) -> Self {
        Self {
            tag,
            body: body.into(),
        }
    }

    /// Builds a request frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the request body fails to encode.
    pub fn request(request: &RpcRequest) -> ProtocolResult<Self> {
        Ok(Self::new(request.method().tag(), request.encode_body()?))
    }

    /// Builds an `Ok` response frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the response body fails to encode.
    pub fn ok(response: &RpcResponse) -> ProtocolResult<Self> {
        Ok(Self::new(StatusCode::Ok.tag(), response.encode_body()?))
    }

    /// Builds a non-`Ok` response frame carrying a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to encode.
    pub fn status(code: StatusCode, message: &str) -> ProtocolResult<Self> {
        Ok(Self::new(code.tag(), encode_status_message(message)?))
    }

    /// Interprets this frame as a request.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownMethod`] for an unknown tag, or a
    /// codec error if the body does not match the method.
    pub fn into_request(self) -> ProtocolResult<RpcRequest> {
        let method = Method::from_tag(self.tag).ok_or(ProtocolError::UnknownMethod(self.tag))?;
        RpcRequest::decode(method, &self.body)
    }

    /// Interprets this frame as the response to `method`.
    ///
    /// A non-`Ok` status yields `Err((status, message))` in the inner
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownStatus`] for an unknown tag, or a
    /// codec error if an `Ok` body does not match the method.
    pub fn into_response(
        self,
        method: Method,
    ) -> ProtocolResult<Result<RpcResponse, (StatusCode, String)>> {
        let status = StatusCode::from_tag(self.tag).ok_or(ProtocolError::UnknownStatus(self.tag))?;
        if !status.is_ok() {
            return Ok(Err((status, decode_status_message(&self.body))));
        }
        RpcResponse::decode(method, &self.body).map(Ok)
    }

    /// Length of the frame on the wire, header included.
    pub fn wire_len(&self) -> usize {
        4 + 1 + self.body.len()
    }
}

/// Reads one frame.
///
/// Returns `Ok(None)` if the peer closed the stream cleanly before a new
/// frame started.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the header announces more
/// than `max_size` bytes, or an I/O error if the stream ends mid-frame.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> ProtocolResult<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        filled += n;
    }

    let len = u32::from_be_bytes(header) as usize;
    if len == 0 {
        return Err(ProtocolError::EmptyFrame);
    }
    if len > max_size {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut buf = BytesMut::zeroed(len);
    reader.read_exact(&mut buf).await?;
    let mut data = buf.freeze();
    let tag = data[0];
    let body = data.split_off(1);
    Ok(Some(Frame { tag, body }))
}

/// Writes one frame and flushes.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the frame exceeds
/// `max_size`, or the underlying I/O error.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame, max_size: usize) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let len = 1 + frame.body.len();
    if len > max_size {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }
    let len_u32 = u32::try_from(len).map_err(|_| ProtocolError::FrameTooLarge {
        size: len,
        max: max_size,
    })?;

    let mut buf = BytesMut::with_capacity(frame.wire_len());
    buf.put_u32(len_u32);
    buf.put_u8(frame.tag);
    buf.put_slice(&frame.body);

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
