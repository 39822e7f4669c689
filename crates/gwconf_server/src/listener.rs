//! TCP and Unix listening sockets.

use std::io;
use std::path::Path;

use gwconf_protocol::{TransportAddress, TransportKind};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// A bound listening socket of either transport.
#[derive(Debug)]
pub enum Listener {
    /// TCP listener.
    Tcp(TcpListener),
    /// Unix domain socket listener, with the endpoint it was bound to.
    Unix(UnixListener, String),
}

/// An accepted connection.
#[derive(Debug)]
pub enum Connection {
    /// TCP stream.
    Tcp(TcpStream),
    /// Unix stream.
    Unix(UnixStream),
}

impl Listener {
    /// Binds a listener for `addr`.
    ///
    /// An empty TCP host binds all interfaces. A Unix path that already
    /// exists is removed first; an endpoint starting with `@` binds in the
    /// Linux abstract namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::StaleSocket`] if an existing socket file cannot
    /// be removed, or [`ServerError::Bind`] if binding fails.
    pub async fn bind(addr: &TransportAddress) -> ServerResult<Self> {
        let bind_err = |source| ServerError::Bind {
            target: addr.to_string(),
            source,
        };

        match addr.kind {
            TransportKind::Tcp => {
                let (host, port) = addr.split_host_port().ok_or_else(|| {
                    bind_err(io::Error::new(io::ErrorKind::InvalidInput, "missing port"))
                })?;
                let port: u16 = port.parse().map_err(|_| {
                    bind_err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid port {port:?}"),
                    ))
                })?;
                let host = if host.is_empty() { "0.0.0.0" } else { host };
                let listener = TcpListener::bind((host, port)).await.map_err(bind_err)?;
                Ok(Listener::Tcp(listener))
            }
            TransportKind::Unix => {
                if let Some(name) = addr.abstract_name() {
                    let listener = bind_abstract(name).map_err(bind_err)?;
                    return Ok(Listener::Unix(listener, addr.endpoint.clone()));
                }
                remove_stale_socket(Path::new(&addr.endpoint))?;
                let listener = UnixListener::bind(&addr.endpoint).map_err(bind_err)?;
                Ok(Listener::Unix(listener, addr.endpoint.clone()))
            }
        }
    }

    /// Returns the address actually bound.
    ///
    /// For TCP this carries the concrete port when an ephemeral one was
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<TransportAddress> {
        match self {
            Listener::Tcp(listener) => Ok(TransportAddress::tcp(listener.local_addr()?.to_string())),
            Listener::Unix(_, endpoint) => Ok(TransportAddress::unix(endpoint.clone())),
        }
    }

    /// Accepts the next connection, returning it with a printable peer name.
    ///
    /// # Errors
    ///
    /// Returns the accept error.
    pub async fn accept(&self) -> io::Result<(Connection, String)> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((Connection::Tcp(stream), peer.to_string()))
            }
            Listener::Unix(listener, endpoint) => {
                let (stream, _) = listener.accept().await?;
                Ok((Connection::Unix(stream), endpoint.clone()))
            }
        }
    }
}

fn remove_stale_socket(path: &Path) -> ServerResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale unix socket");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ServerError::StaleSocket {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(target_os = "linux")]
fn bind_abstract(name: &str) -> io::Result<UnixListener> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::{SocketAddr, UnixListener as StdUnixListener};

    let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
    let listener = StdUnixListener::bind_addr(&addr)?;
    listener.set_nonblocking(true)?;
    UnixListener::from_std(listener)
}

#[cfg(not(target_os = "linux"))]
fn bind_abstract(_name: &str) -> io::Result<UnixListener> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract unix sockets are only available on linux",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwconf_protocol::resolve;

    #[tokio::test]
    async fn tcp_ephemeral_port_is_reported() {
        let listener = Listener::bind(&resolve("tcp://127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (_, port) = addr.split_host_port().unwrap();
        assert_ne!(port, "0");
    }

    #[tokio::test]
    async fn stale_unix_socket_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gw.sock");
        std::fs::write(&path, b"stale").unwrap();

        let addr = TransportAddress::unix(path.display().to_string());
        let listener = Listener::bind(&addr).await.unwrap();
        assert_eq!(listener.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn invalid_port_is_bind_error() {
        let err = Listener::bind(&TransportAddress::tcp("127.0.0.1:http"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.is_startup_error());
    }
}
