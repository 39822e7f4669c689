//! # gwconf client
//!
//! Client side of the gwconf config service.
//!
//! This crate provides:
//! - [`ClientConfig`] and [`RetryConfig`] (deadline and readiness backoff)
//! - [`ConfigClient`], a typed client over TCP or Unix sockets
//! - one-shot operations ([`do_get_config`], [`do_get_config_generation`],
//!   [`do_update_config`]) that report results the way `gwtestctl` does
//! - [`DocumentSource`], the injected reader for documents to upload
//!
//! ## Failure classes
//!
//! A call can fail in transport (unreachable, deadline), with a non-`OK`
//! RPC status, on decode, or at application level when an update is
//! answered with an error code other than `ERROR_NONE`. [`ClientError`]
//! keeps these apart.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod client;
mod config;
mod connection;
mod error;
mod ops;

pub use client::ConfigClient;
pub use config::{ClientConfig, RetryConfig, DEFAULT_TIMEOUT};
pub use connection::{dial, dial_with_retry, Stream};
pub use error::{ClientError, ClientResult};
pub use ops::{
    decode_document, do_get_config, do_get_config_generation, do_update_config, DocumentSource,
    FsDocumentSource,
};
