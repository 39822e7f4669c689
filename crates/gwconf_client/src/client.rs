//! Typed RPC client for a config server.

use std::future::Future;
use std::time::Duration;

use gwconf_protocol::{
    read_frame, resolve, write_frame, ConfigDocument, Frame, GetConfigGenerationRequest,
    GetConfigRequest, Method, ProtocolError, RpcRequest, RpcResponse, UpdateConfigRequest,
    UpdateConfigResponse, MAX_FRAME_SIZE,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::{dial, dial_with_retry, Stream};
use crate::error::{ClientError, ClientResult};

/// A connection to one config server.
///
/// Calls on one client are issued in order over a single stream.
#[derive(Debug)]
pub struct ConfigClient {
    stream: Stream,
    target: String,
    deadline: Option<Duration>,
    max_frame_size: usize,
}

impl ConfigClient {
    /// Resolves the configured target and connects to it.
    ///
    /// Without `wait_for_ready` a single dial is attempted within the
    /// deadline. With it, dialing is retried until the server answers or
    /// the retry budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTarget`] for a bad target, or a
    /// transport error if the server cannot be reached.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let addr = resolve(&config.target)?;
        let deadline = config.deadline();
        let stream = match deadline {
            Some(timeout) => with_deadline("connect", timeout, dial(&addr)).await?,
            None => dial_with_retry(&addr, &config.retry).await?,
        };
        Ok(Self {
            stream,
            target: addr.to_string(),
            deadline,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    /// Returns the target this client is connected to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Fetches the current document.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or decode error.
    pub async fn get_config(&mut self) -> ClientResult<ConfigDocument> {
        match self.call(RpcRequest::GetConfig(GetConfigRequest)).await? {
            RpcResponse::Config(config) => Ok(config),
            other => Err(unexpected(Method::GetConfig, &other)),
        }
    }

    /// Fetches the current generation.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or decode error.
    pub async fn get_config_generation(&mut self) -> ClientResult<u64> {
        match self
            .call(RpcRequest::GetConfigGeneration(GetConfigGenerationRequest))
            .await?
        {
            RpcResponse::Generation(response) => Ok(response.generation),
            other => Err(unexpected(Method::GetConfigGeneration, &other)),
        }
    }

    /// Sends a replacement document.
    ///
    /// The returned response may still carry a non-`None` error code; this
    /// method only fails if the call itself fails.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or decode error.
    pub async fn update_config(
        &mut self,
        config: ConfigDocument,
    ) -> ClientResult<UpdateConfigResponse> {
        match self
            .call(RpcRequest::UpdateConfig(UpdateConfigRequest { config }))
            .await?
        {
            RpcResponse::Update(response) => Ok(response),
            other => Err(unexpected(Method::UpdateConfig, &other)),
        }
    }

    async fn call(&mut self, request: RpcRequest) -> ClientResult<RpcResponse> {
        let method = request.method();
        let frame = Frame::request(&request)?;
        let target = self.target.clone();
        let max = self.max_frame_size;
        let stream = &mut self.stream;

        let exchange = async move {
            write_frame(stream, &frame, max)
                .await
                .map_err(|e| io_to_transport(&target, e))?;
            let reply = read_frame(stream, max)
                .await
                .map_err(|e| io_to_transport(&target, e))?
                .ok_or_else(|| {
                    ClientError::transport(
                        &target,
                        std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
                    )
                })?;
            Ok::<_, ClientError>(reply)
        };
        let reply = match self.deadline {
            Some(timeout) => with_deadline(method.name(), timeout, exchange).await?,
            None => exchange.await?,
        };

        debug!(%method, status = reply.tag, "response frame");
        match reply.into_response(method)? {
            Ok(response) => Ok(response),
            Err((status, message)) => Err(ClientError::Status {
                operation: method.name(),
                status,
                message,
            }),
        }
    }
}

pub(crate) async fn with_deadline<T>(
    operation: &'static str,
    timeout: Duration,
    fut: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ClientError::DeadlineExceeded { operation, timeout })?
}

fn io_to_transport(target: &str, err: ProtocolError) -> ClientError {
    match err {
        ProtocolError::Io(source) => ClientError::transport(target, source),
        other => ClientError::Protocol(other),
    }
}

fn unexpected(method: Method, response: &RpcResponse) -> ClientError {
    ClientError::Protocol(ProtocolError::invalid_message(format!(
        "{method} answered with a {} response",
        response.method()
    )))
}
