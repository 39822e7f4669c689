//! Fake server command implementation.

use std::sync::Arc;

use gwconf_server::{ConfigServer, MockConfigService, ServerConfig};
use tracing::{info, warn};

/// Runs an in-memory config server on `target` until Ctrl-C.
///
/// Every accepted update is dumped to stdout as YAML.
pub async fn run(target: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::default().with_dump_updates(true);
    let service = Arc::new(MockConfigService::from_config(&config));
    let server = ConfigServer::bind(target, config, service)
        .await
        .map_err(|e| format!("running fake server: {e}"))?;

    info!(target = %server.local_addr(), "Starting fake server");

    server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
        .map_err(|e| format!("running fake server: {e}"))?;
    Ok(())
}
