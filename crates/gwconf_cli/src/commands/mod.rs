//! CLI command implementations.

pub mod fake_server;
pub mod get_config;
pub mod get_config_generation;
pub mod update_config;

use gwconf_client::ClientConfig;

/// Builds the client configuration shared by the client commands.
pub fn client_config(target: &str, wait: bool) -> ClientConfig {
    ClientConfig::new(target).with_wait_for_ready(wait)
}
