//! Transport addresses.
//!
//! A target string names where a config service listens:
//!
//! - `tcp://host:port`, `tcp://:port` (all interfaces / loopback) and
//!   `tcp://:0` (ephemeral port, server side)
//! - `unix:///path/to/socket`: a filesystem socket when a server binds it,
//!   and the abstract-namespace name `/path/to/socket` when a client dials
//!   it. `unix://@name` makes the server bind the abstract name `name` too.
//!
//! Only the scheme is validated here. The endpoint is kept verbatim and any
//! problem with it surfaces when the socket is bound or dialed.

use std::fmt;
use std::str::FromStr;

use crate::error::TargetError;

const TCP_SCHEME: &str = "tcp";
const UNIX_SCHEME: &str = "unix";

/// Socket family of a transport address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// TCP socket; endpoint is `host:port`.
    Tcp,
    /// Unix-domain socket; endpoint is a path or `@abstract-name`.
    Unix,
}

impl TransportKind {
    /// Scheme prefix used in target strings.
    pub fn scheme(self) -> &'static str {
        match self {
            TransportKind::Tcp => TCP_SCHEME,
            TransportKind::Unix => UNIX_SCHEME,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A resolved transport address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportAddress {
    /// Socket family.
    pub kind: TransportKind,
    /// Everything after `scheme://`, unmodified.
    pub endpoint: String,
}

impl TransportAddress {
    /// Creates a TCP address.
    pub fn tcp(endpoint: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Tcp,
            endpoint: endpoint.into(),
        }
    }

    /// Creates a Unix-domain address.
    pub fn unix(endpoint: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Unix,
            endpoint: endpoint.into(),
        }
    }

    /// Splits a TCP endpoint into host and port text.
    ///
    /// The split happens at the last `:`, so bracketed IPv6 hosts keep their
    /// brackets stripped: `[::1]:80` yields `("::1", "80")`. Returns `None`
    /// for Unix addresses or endpoints without a port separator.
    pub fn split_host_port(&self) -> Option<(&str, &str)> {
        if self.kind != TransportKind::Tcp {
            return None;
        }
        let (host, port) = self.endpoint.rsplit_once(':')?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        Some((host, port))
    }

    /// Returns the abstract socket name if this is a `unix://@name` address.
    ///
    /// Clients dial every Unix endpoint in the abstract namespace and use
    /// this only to drop the `@`.
    pub fn abstract_name(&self) -> Option<&str> {
        match self.kind {
            TransportKind::Unix => self.endpoint.strip_prefix('@'),
            TransportKind::Tcp => None,
        }
    }
}

/// Resolves a target string into a transport address.
///
/// # Errors
///
/// Returns [`TargetError::InvalidTarget`] unless the target starts with
/// `tcp://` or `unix://`.
pub fn resolve(target: &str) -> Result<TransportAddress, TargetError> {
    let (scheme, endpoint) = target
        .split_once("://")
        .ok_or_else(|| TargetError::invalid(target, "missing `scheme://` prefix"))?;

    match scheme {
        TCP_SCHEME => Ok(TransportAddress::tcp(endpoint)),
        UNIX_SCHEME => Ok(TransportAddress::unix(endpoint)),
        other => Err(TargetError::invalid(
            target,
            format!("unsupported scheme `{other}`, expected `tcp` or `unix`"),
        )),
    }
}

impl FromStr for TransportAddress {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

impl fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.kind, self.endpoint)
    }
}
