//! The config server accept loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gwconf_protocol::{
    read_frame, resolve, write_frame, ProtocolError, StatusCode, TransportAddress,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{status_frame, RequestHandler};
use crate::listener::{Connection, Listener};
use crate::service::ConfigService;

/// A config server bound to one transport address.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use gwconf_server::{ConfigServer, MockConfigService, ServerConfig};
///
/// # async fn run() -> gwconf_server::ServerResult<()> {
/// let config = ServerConfig::default();
/// let service = Arc::new(MockConfigService::from_config(&config));
/// let server = ConfigServer::bind("tcp://:0", config, service).await?;
/// let handle = server.spawn();
/// println!("listening on {}", handle.local_addr());
/// handle.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigServer {
    listener: Listener,
    local_addr: TransportAddress,
    config: ServerConfig,
    handler: RequestHandler,
    connection_limit: Arc<Semaphore>,
}

impl ConfigServer {
    /// Resolves `target` and binds a listener for it.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidTarget`] for a bad target, or a bind
    /// error if the socket cannot be opened.
    pub async fn bind(
        target: &str,
        config: ServerConfig,
        service: Arc<dyn ConfigService>,
    ) -> ServerResult<Self> {
        let addr = resolve(target)?;
        let listener = Listener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "server listening"
        );

        Ok(Self {
            listener,
            local_addr,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            handler: RequestHandler::new(service),
            config,
        })
    }

    /// Returns the address actually bound.
    pub fn local_addr(&self) -> &TransportAddress {
        &self.local_addr
    }

    /// Serves until the task is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serves until `shutdown` completes.
    ///
    /// Connections already accepted keep running on their own tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> ServerResult<()> {
        tokio::pin!(shutdown);
        let mut accept_failures = 0u32;

        loop {
            let permit = tokio::select! {
                () = &mut shutdown => break,
                permit = Arc::clone(&self.connection_limit).acquire_owned() => permit
                    .map_err(|_| ServerError::Internal("connection limit closed".to_string()))?,
            };

            let (conn, peer) = tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        accept_failures = accept_failures.saturating_add(1);
                        let delay = accept_backoff(accept_failures);
                        warn!(error = %e, ?delay, "accept failed");
                        tokio::select! {
                            () = &mut shutdown => break,
                            () = tokio::time::sleep(delay) => continue,
                        }
                    }
                },
            };
            accept_failures = 0;

            debug!(
                peer = %peer,
                available = self.connection_limit.available_permits(),
                "connection accepted"
            );

            let handler = self.handler.clone();
            let max_frame_size = self.config.max_frame_size;
            tokio::spawn(async move {
                let result = match conn {
                    Connection::Tcp(stream) => {
                        serve_connection(stream, &handler, max_frame_size).await
                    }
                    Connection::Unix(stream) => {
                        serve_connection(stream, &handler, max_frame_size).await
                    }
                };
                match result {
                    Ok(()) => debug!(peer = %peer, "connection closed"),
                    Err(e) => warn!(peer = %peer, error = %e, "connection failed"),
                }
                drop(permit);
            });
        }

        info!(address = %self.local_addr, "server stopped");
        Ok(())
    }

    /// Runs the server on a background task.
    pub fn spawn(self) -> ServerHandle {
        let local_addr = self.local_addr.clone();
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(self.serve_with_shutdown(async move {
            let _ = rx.await;
        }));
        ServerHandle {
            local_addr,
            shutdown: Some(tx),
            task,
        }
    }
}

impl std::fmt::Debug for ConfigServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigServer")
            .field("local_addr", &self.local_addr)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Handle to a server running on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: TransportAddress,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<ServerResult<()>>,
}

impl ServerHandle {
    /// Returns the address the server is bound to.
    pub fn local_addr(&self) -> &TransportAddress {
        &self.local_addr
    }

    /// Returns the address as a target string clients can dial.
    pub fn target(&self) -> String {
        self.local_addr.to_string()
    }

    /// Stops accepting connections and waits for the accept loop to end.
    ///
    /// # Errors
    ///
    /// Returns the accept loop's error, or [`ServerError::Internal`] if the
    /// task panicked.
    pub async fn shutdown(mut self) -> ServerResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| ServerError::Internal(format!("server task failed: {e}")))?
    }
}

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Pause before accepting again after `failures` consecutive accept errors.
fn accept_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1 << shift)
        .min(ACCEPT_BACKOFF_MAX)
}

/// Serves requests on one connection, in order, until the peer closes it.
async fn serve_connection<S>(
    mut stream: S,
    handler: &RequestHandler,
    max_frame_size: usize,
) -> ServerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = match read_frame(&mut stream, max_frame_size).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(e @ (ProtocolError::FrameTooLarge { .. } | ProtocolError::EmptyFrame)) => {
                let reply = status_frame(StatusCode::InvalidArgument, &e.to_string());
                let _ = write_frame(&mut stream, &reply, max_frame_size).await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let reply = handler.handle_frame(frame);
        write_frame(&mut stream, &reply, max_frame_size).await?;
    }
}
