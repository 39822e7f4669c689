//! Dialing a config server over TCP or a Unix socket.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use gwconf_protocol::{TargetError, TransportAddress, TransportKind};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult};

/// A connected stream of either transport.
#[derive(Debug)]
pub enum Stream {
    /// TCP stream.
    Tcp(TcpStream),
    /// Unix stream.
    Unix(UnixStream),
}

/// Dials `addr` once.
///
/// An empty TCP host dials `localhost`. Every Unix endpoint names a socket
/// in the Linux abstract namespace: `unix:///run/gw.sock` dials the abstract
/// name `/run/gw.sock`, and a leading `@` is dropped.
///
/// # Errors
///
/// Returns [`ClientError::InvalidTarget`] if a TCP endpoint has no usable
/// port, or [`ClientError::Transport`] if the connection cannot be opened.
pub async fn dial(addr: &TransportAddress) -> ClientResult<Stream> {
    let target = addr.to_string();
    let stream = match addr.kind {
        TransportKind::Tcp => {
            let (host, port) = addr
                .split_host_port()
                .ok_or_else(|| TargetError::invalid(&target, "missing port"))?;
            let port: u16 = port
                .parse()
                .map_err(|_| TargetError::invalid(&target, format!("invalid port {port:?}")))?;
            let host = if host.is_empty() { "localhost" } else { host };
            let stream = TcpStream::connect((host, port))
                .await
                .map_err(|e| ClientError::transport(&target, e))?;
            // requests are small and latency bound
            stream
                .set_nodelay(true)
                .map_err(|e| ClientError::transport(&target, e))?;
            Stream::Tcp(stream)
        }
        TransportKind::Unix => {
            let name = addr.abstract_name().unwrap_or(&addr.endpoint);
            let stream = connect_abstract(name).map_err(|e| ClientError::transport(&target, e))?;
            Stream::Unix(stream)
        }
    };
    debug!(target = %target, "connected");
    Ok(stream)
}

/// Dials `addr`, retrying transport failures with backoff.
///
/// A malformed endpoint fails on the first attempt.
///
/// # Errors
///
/// Returns the last transport error once `retry.max_attempts` is exhausted.
pub async fn dial_with_retry(addr: &TransportAddress, retry: &RetryConfig) -> ClientResult<Stream> {
    let mut attempt = 0u32;
    loop {
        match dial(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) if e.is_transport() && attempt.saturating_add(1) < retry.max_attempts => {
                attempt += 1;
                let delay = retry.delay_for_attempt(attempt);
                debug!(target = %addr, attempt, ?delay, error = %e, "server not ready, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(target_os = "linux")]
fn connect_abstract(name: &str) -> io::Result<UnixStream> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::{SocketAddr, UnixStream as StdUnixStream};

    let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
    let stream = StdUnixStream::connect_addr(&addr)?;
    stream.set_nonblocking(true)?;
    UnixStream::from_std(stream)
}

#[cfg(not(target_os = "linux"))]
fn connect_abstract(_name: &str) -> io::Result<UnixStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract unix sockets are only available on linux",
    ))
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unique_name(label: &str) -> String {
        format!("/tmp/gwconf-{label}-{}.sock", std::process::id())
    }

    #[cfg(target_os = "linux")]
    fn bind_abstract(name: &str) -> tokio::net::UnixListener {
        use std::os::linux::net::SocketAddrExt;
        use std::os::unix::net::{SocketAddr, UnixListener};

        let addr = SocketAddr::from_abstract_name(name.as_bytes()).unwrap();
        let listener = UnixListener::bind_addr(&addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        tokio::net::UnixListener::from_std(listener).unwrap()
    }

    #[tokio::test]
    async fn refused_dial_is_transport_error() {
        let addr = TransportAddress::unix(unique_name("refused"));

        let err = dial(&addr).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn unix_path_dials_abstract_name() {
        let name = unique_name("abstract-path");
        let listener = bind_abstract(&name);
        // no filesystem entry exists for the name
        assert!(!std::path::Path::new(&name).exists());

        let stream = dial(&TransportAddress::unix(name.as_str())).await.unwrap();
        assert!(matches!(stream, Stream::Unix(_)));
        listener.accept().await.unwrap();
    }

    #[tokio::test]
    async fn bad_tcp_port_is_invalid_target() {
        for endpoint in ["127.0.0.1", "127.0.0.1:http", "127.0.0.1:70000"] {
            let err = dial(&TransportAddress::tcp(endpoint)).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidTarget(_)), "{endpoint}: {err}");
            assert!(!err.is_transport());
        }
    }

    #[tokio::test]
    async fn retry_does_not_repeat_bad_endpoint() {
        let retry = RetryConfig::until_ready().with_initial_delay(Duration::from_secs(1));
        let addr = TransportAddress::tcp("127.0.0.1");
        let dialing = dial_with_retry(&addr, &retry);

        let err = tokio::time::timeout(Duration::from_millis(500), dialing)
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let addr = TransportAddress::unix(unique_name("gives-up"));
        let retry = RetryConfig::new(3)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false);

        let err = dial_with_retry(&addr, &retry).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn retry_waits_for_late_listener() {
        let name = unique_name("late");
        let addr = TransportAddress::unix(name.as_str());

        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let listener = bind_abstract(&name);
            listener.accept().await.unwrap();
        });

        let retry = RetryConfig::until_ready()
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(20));
        let stream = dial_with_retry(&addr, &retry).await.unwrap();
        assert!(matches!(stream, Stream::Unix(_)));
        server.await.unwrap();
    }
}
