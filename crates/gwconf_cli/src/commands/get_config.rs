//! Get config command implementation.

use gwconf_client::do_get_config;

use super::client_config;

/// Runs the get-config command, printing the document to stdout.
pub async fn run(target: &str, wait: bool) -> Result<(), Box<dyn std::error::Error>> {
    do_get_config(&client_config(target, wait), std::io::stdout().lock())
        .await
        .map_err(|e| format!("getting config: {e}"))?;
    Ok(())
}
