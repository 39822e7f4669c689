//! Server configuration.

use gwconf_protocol::MAX_FRAME_SIZE;

use crate::service::GenerationPolicy;

/// Configuration for the config server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Largest frame accepted or sent, tag included.
    pub max_frame_size: usize,
    /// How incoming generations are checked against the stored one.
    pub generation_policy: GenerationPolicy,
    /// Whether each RPC is logged.
    pub log_requests: bool,
    /// Whether accepted documents are dumped to standard output.
    pub dump_updates: bool,
}

impl ServerConfig {
    /// Creates a configuration with default limits.
    pub fn new() -> Self {
        Self {
            max_connections: 1000,
            max_frame_size: MAX_FRAME_SIZE,
            generation_policy: GenerationPolicy::default(),
            log_requests: true,
            dump_updates: false,
        }
    }

    /// Sets the maximum concurrent connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Sets the generation policy.
    pub fn with_generation_policy(mut self, policy: GenerationPolicy) -> Self {
        self.generation_policy = policy;
        self
    }

    /// Enables or disables per-request logging.
    pub fn with_log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// Enables or disables dumping accepted documents.
    pub fn with_dump_updates(mut self, enabled: bool) -> Self {
        self.dump_updates = enabled;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
