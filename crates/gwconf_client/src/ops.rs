//! One-shot operations: connect, issue a single call, report the result.
//!
//! Each operation resolves the target, connects, performs the call and
//! writes data to the supplied output. Connecting and calling share one
//! deadline. Logs go through `tracing`; only
//! data is written to the output.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use gwconf_protocol::{ConfigDocument, DocumentCodec, Method, StatusCode};
use tracing::{error, info};

use crate::client::{with_deadline, ConfigClient};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Where `UpdateConfig` reads its document from.
pub trait DocumentSource: Send + Sync {
    /// Reads the document at `path` as text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the document cannot be read.
    fn read_document(&self, path: &Path) -> ClientResult<String>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentSource {
    base: Option<PathBuf>,
}

impl FsDocumentSource {
    /// Reads paths relative to the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads relative paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl DocumentSource for FsDocumentSource {
    fn read_document(&self, path: &Path) -> ClientResult<String> {
        let path = self.resolve(path);
        std::fs::read_to_string(&path).map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Fetches the document and writes it to `out` as YAML.
///
/// # Errors
///
/// Returns a transport, status or decode error, or an I/O error writing
/// `out`.
pub async fn do_get_config(config: &ClientConfig, mut out: impl Write) -> ClientResult<()> {
    info!(target = %config.target, "Getting config");

    let result = within_deadline(config, Method::GetConfig, async {
        let mut client = ConfigClient::connect(config).await?;
        client.get_config().await
    })
    .await;
    let doc = log_response(Method::GetConfig, result)?;
    info!(generation = doc.generation, "Response");

    let yaml = DocumentCodec::gateway().encode(&doc)?;
    out.write_all(yaml.as_bytes())
        .and_then(|()| out.flush())
        .map_err(stdout_err)
}

/// Fetches the generation and writes it to `out` on its own line.
///
/// # Errors
///
/// Returns a transport or status error, or an I/O error writing `out`.
pub async fn do_get_config_generation(
    config: &ClientConfig,
    mut out: impl Write,
) -> ClientResult<()> {
    info!(target = %config.target, "Getting config generation");

    let result = within_deadline(config, Method::GetConfigGeneration, async {
        let mut client = ConfigClient::connect(config).await?;
        client.get_config_generation().await
    })
    .await;
    let generation = log_response(Method::GetConfigGeneration, result)?;

    writeln!(out, "{generation}")
        .and_then(|()| out.flush())
        .map_err(stdout_err)
}

/// Reads the document at `path` from `source`, decodes it and sends it.
///
/// The document is decoded before anything is dialed, so a bad document
/// never reaches the network.
///
/// # Errors
///
/// Returns an I/O or decode error for the document, a transport or status
/// error for the call, or [`ClientError::Application`] if the server
/// reports a non-`None` error code.
pub async fn do_update_config(
    config: &ClientConfig,
    source: &dyn DocumentSource,
    path: &Path,
) -> ClientResult<()> {
    info!(target = %config.target, file = %path.display(), "Updating config");

    let text = source.read_document(path)?;
    let doc = decode_document(&text)?;

    let result = within_deadline(config, Method::UpdateConfig, async {
        let mut client = ConfigClient::connect(config).await?;
        client.update_config(doc).await
    })
    .await;
    let response = log_response(Method::UpdateConfig, result)?;
    info!(detail = %response.message, error = %response.error, "Response");

    if !response.error.is_none() {
        return Err(ClientError::Application {
            code: response.error,
            message: response.message,
        });
    }
    Ok(())
}

/// Decodes a gateway document from YAML text.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the text is not a valid document.
pub fn decode_document(text: &str) -> ClientResult<ConfigDocument> {
    Ok(DocumentCodec::gateway().decode(text)?)
}

async fn within_deadline<T>(
    config: &ClientConfig,
    method: Method,
    call: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    match config.deadline() {
        Some(timeout) => with_deadline(method.name(), timeout, call).await,
        None => call.await,
    }
}

fn log_response<T>(method: Method, result: ClientResult<T>) -> ClientResult<T> {
    let status = match &result {
        Ok(_) => StatusCode::Ok,
        Err(e) => e.status_code().unwrap_or(StatusCode::Internal),
    };
    info!(%method, %status, "Response");
    if let Err(e) = &result {
        error!(%method, error = %e, "Response");
    }
    result
}

fn stdout_err(source: std::io::Error) -> ClientError {
    ClientError::Io {
        path: "<stdout>".to_string(),
        source,
    }
}
