//! Dispatch of decoded requests to a [`ConfigService`].

use std::sync::Arc;

use gwconf_protocol::{
    Frame, GetConfigGenerationResponse, RpcRequest, RpcResponse, StatusCode,
};
use tracing::{debug, warn};

use crate::service::ConfigService;

/// Turns request frames into response frames.
#[derive(Clone)]
pub struct RequestHandler {
    service: Arc<dyn ConfigService>,
}

impl RequestHandler {
    /// Creates a handler for `service`.
    pub fn new(service: Arc<dyn ConfigService>) -> Self {
        Self { service }
    }

    /// Handles a decoded request.
    pub fn handle(&self, request: RpcRequest) -> RpcResponse {
        match request {
            RpcRequest::GetConfig(_) => {
                let config = self.service.get_config();
                RpcResponse::Config(Arc::unwrap_or_clone(config))
            }
            RpcRequest::GetConfigGeneration(_) => {
                RpcResponse::Generation(GetConfigGenerationResponse {
                    generation: self.service.get_config_generation(),
                })
            }
            RpcRequest::UpdateConfig(update) => {
                RpcResponse::Update(self.service.update_config(update.config))
            }
        }
    }

    /// Handles a raw request frame.
    ///
    /// Never fails: undecodable requests become `InvalidArgument`, unknown
    /// methods `Unimplemented`, and a response that cannot be encoded
    /// `Internal`.
    pub fn handle_frame(&self, frame: Frame) -> Frame {
        let tag = frame.tag;
        let request = match frame.into_request() {
            Ok(request) => request,
            Err(e) => {
                warn!(tag, error = %e, "rejecting request");
                let message = e.to_string();
                return status_frame(StatusCode::from(e), &message);
            }
        };

        let method = request.method();
        debug!(%method, "handling request");
        let response = self.handle(request);
        match Frame::ok(&response) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%method, error = %e, "failed to encode response");
                status_frame(StatusCode::Internal, &e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler").finish_non_exhaustive()
    }
}

/// Builds a status frame, falling back to an empty body.
pub(crate) fn status_frame(code: StatusCode, message: &str) -> Frame {
    Frame::status(code, message).unwrap_or_else(|_| Frame::new(code.tag(), Vec::new()))
}
