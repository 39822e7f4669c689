//! The config service and its mock implementation.

use std::sync::Arc;

use gwconf_protocol::{ConfigDocument, ErrorCode, UpdateConfigResponse};

use crate::config::ServerConfig;
use crate::events::{EventSink, NoopEventSink, StoreEvent, TracingEventSink};
use crate::store::ConfigStore;

/// The three operations a config server answers.
pub trait ConfigService: Send + Sync {
    /// Returns the current document.
    fn get_config(&self) -> Arc<ConfigDocument>;

    /// Returns the current generation.
    fn get_config_generation(&self) -> u64;

    /// Replaces the document in full.
    fn update_config(&self, config: ConfigDocument) -> UpdateConfigResponse;
}

/// How an incoming generation is checked against the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationPolicy {
    /// Any generation is accepted, including older ones.
    #[default]
    AcceptAny,
    /// The incoming generation must be greater than the stored one.
    RequireIncreasing,
}

impl GenerationPolicy {
    /// Checks a proposed update.
    ///
    /// # Errors
    ///
    /// Returns a reason when the update is refused.
    pub fn check(self, current: u64, proposed: u64) -> Result<(), String> {
        match self {
            GenerationPolicy::AcceptAny => Ok(()),
            GenerationPolicy::RequireIncreasing if proposed > current => Ok(()),
            GenerationPolicy::RequireIncreasing => Err(format!(
                "generation {proposed} is not newer than current generation {current}"
            )),
        }
    }
}

/// In-memory config service backed by a [`ConfigStore`].
///
/// Updates replace the stored document in full. With the default
/// [`GenerationPolicy::AcceptAny`] every update succeeds with
/// [`ErrorCode::None`].
pub struct MockConfigService {
    store: Arc<ConfigStore>,
    sink: Arc<dyn EventSink>,
    policy: GenerationPolicy,
}

impl MockConfigService {
    /// Creates a service over `store` that records nothing.
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            sink: Arc::new(NoopEventSink),
            policy: GenerationPolicy::default(),
        }
    }

    /// Creates a service with a fresh store, configured from `config`.
    ///
    /// Events go to a [`TracingEventSink`] when request logging or update
    /// dumping is enabled.
    pub fn from_config(config: &ServerConfig) -> Self {
        let service =
            Self::new(Arc::new(ConfigStore::new())).with_policy(config.generation_policy);
        if !config.log_requests && !config.dump_updates {
            return service;
        }
        let sink = if config.dump_updates {
            TracingEventSink::new().with_stdout_dump()
        } else {
            TracingEventSink::new()
        };
        service.with_event_sink(Arc::new(sink))
    }

    /// Sets the event sink.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the generation policy.
    pub fn with_policy(mut self, policy: GenerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the document currently held, for inspection in tests.
    pub fn observed_config(&self) -> Arc<ConfigDocument> {
        self.store.get()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }
}

impl std::fmt::Debug for MockConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConfigService")
            .field("generation", &self.store.generation())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ConfigService for MockConfigService {
    fn get_config(&self) -> Arc<ConfigDocument> {
        let config = self.store.get();
        self.sink.record(&StoreEvent::ConfigRead {
            generation: config.generation,
        });
        config
    }

    fn get_config_generation(&self) -> u64 {
        let generation = self.store.generation();
        self.sink.record(&StoreEvent::GenerationRead { generation });
        generation
    }

    fn update_config(&self, config: ConfigDocument) -> UpdateConfigResponse {
        let proposed = config.generation;
        let policy = self.policy;
        let config = Arc::new(config);
        let result = self.store.replace_if(Arc::clone(&config), |current, next| {
            policy
                .check(current.generation, next.generation)
                .map_err(|reason| (current.generation, reason))
        });

        match result {
            Ok(previous) => {
                self.sink.record(&StoreEvent::ConfigReplaced {
                    previous: previous.generation,
                    config: &config,
                });
                UpdateConfigResponse::ok()
            }
            Err((current, reason)) => {
                self.sink.record(&StoreEvent::UpdateRejected {
                    current,
                    proposed,
                    reason: &reason,
                });
                UpdateConfigResponse::failed(ErrorCode::ValidationFailed, reason)
            }
        }
    }
}
