//! Get config generation command implementation.

use gwconf_client::do_get_config_generation;

use super::client_config;

/// Runs the get-config-gen command, printing the generation to stdout.
pub async fn run(target: &str, wait: bool) -> Result<(), Box<dyn std::error::Error>> {
    do_get_config_generation(&client_config(target, wait), std::io::stdout().lock())
        .await
        .map_err(|e| format!("getting config gen: {e}"))?;
    Ok(())
}
