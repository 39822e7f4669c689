//! Update config command implementation.

use std::path::Path;

use gwconf_client::{do_update_config, FsDocumentSource};

use super::client_config;

/// Runs the update-config command with the document at `config_file`.
pub async fn run(
    target: &str,
    config_file: &Path,
    wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    do_update_config(&client_config(target, wait), &FsDocumentSource::new(), config_file)
        .await
        .map_err(|e| format!("updating config: {e}"))?;
    Ok(())
}
