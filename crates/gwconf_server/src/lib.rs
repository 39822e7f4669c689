//! # gwconf server
//!
//! In-memory config store and a mock config service reachable over TCP or
//! Unix sockets.
//!
//! This crate provides:
//! - [`ConfigStore`], the authoritative document behind a lock
//! - [`ConfigService`] and the in-memory [`MockConfigService`]
//! - [`EventSink`], the hook through which service activity is observed
//! - [`ConfigServer`], the accept loop serving framed requests
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ServerConfig::default().with_dump_updates(true);
//! let service = Arc::new(MockConfigService::from_config(&config));
//! let server = ConfigServer::bind("unix:///tmp/gw.sock", config, service).await?;
//! server.serve_with_shutdown(ctrl_c).await?;
//! ```
//!
//! # Behaviour
//!
//! `UpdateConfig` replaces the document in full. A concurrent `GetConfig`
//! sees either the old or the new document. Each server owns its store, so
//! tests can run several servers in one process.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod events;
mod handler;
mod listener;
mod server;
mod service;
mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use events::{EventSink, NoopEventSink, StoreEvent, TracingEventSink};
pub use handler::RequestHandler;
pub use listener::{Connection, Listener};
pub use server::{ConfigServer, ServerHandle};
pub use service::{ConfigService, GenerationPolicy, MockConfigService};
pub use store::ConfigStore;
