//! Observation hook for service activity.

use std::io::Write;

use gwconf_protocol::{ConfigDocument, DocumentCodec};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Something the service did to its store.
#[derive(Debug, Clone, Copy)]
pub enum StoreEvent<'a> {
    /// The full document was read.
    ConfigRead {
        /// Generation served.
        generation: u64,
    },
    /// The generation was read.
    GenerationRead {
        /// Generation served.
        generation: u64,
    },
    /// The document was replaced.
    ConfigReplaced {
        /// Generation before the update.
        previous: u64,
        /// The new document.
        config: &'a ConfigDocument,
    },
    /// An update was refused.
    UpdateRejected {
        /// Generation currently held.
        current: u64,
        /// Generation that was offered.
        proposed: u64,
        /// Why it was refused.
        reason: &'a str,
    },
}

/// Receives [`StoreEvent`]s from a service.
pub trait EventSink: Send + Sync {
    /// Records one event. Must not block for long; it runs on the request
    /// path.
    fn record(&self, event: &StoreEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &StoreEvent<'_>) {}
}

/// Logs events through `tracing` and optionally dumps accepted documents.
///
/// Dumps are written as YAML preceded by a `---` separator line, so a
/// sequence of updates forms a valid multi-document stream.
pub struct TracingEventSink {
    codec: DocumentCodec,
    dump: Option<Mutex<Box<dyn Write + Send>>>,
}

impl TracingEventSink {
    /// Creates a sink that only logs.
    pub fn new() -> Self {
        Self {
            codec: DocumentCodec::gateway(),
            dump: None,
        }
    }

    /// Dumps every accepted document to standard output.
    pub fn with_stdout_dump(self) -> Self {
        self.with_dump_writer(std::io::stdout())
    }

    /// Dumps every accepted document to `writer`.
    pub fn with_dump_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.dump = Some(Mutex::new(Box::new(writer)));
        self
    }

    /// Uses `codec` to render dumped documents.
    pub fn with_codec(mut self, codec: DocumentCodec) -> Self {
        self.codec = codec;
        self
    }

    fn dump(&self, config: &ConfigDocument) {
        let Some(writer) = &self.dump else {
            return;
        };
        let yaml = match self.codec.encode(config) {
            Ok(yaml) => yaml,
            Err(e) => {
                warn!(error = %e, "failed to marshal config");
                return;
            }
        };
        let mut writer = writer.lock();
        let result = writeln!(writer, "---")
            .and_then(|()| writer.write_all(yaml.as_bytes()))
            .and_then(|()| writer.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to dump config");
        }
    }
}

impl Default for TracingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TracingEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingEventSink")
            .field("dump", &self.dump.is_some())
            .finish()
    }
}

impl EventSink for TracingEventSink {
    fn record(&self, event: &StoreEvent<'_>) {
        match *event {
            StoreEvent::ConfigRead { generation } => {
                info!(gen = generation, "GetConfig called");
            }
            StoreEvent::GenerationRead { generation } => {
                info!(gen = generation, "GetConfigGeneration called");
            }
            StoreEvent::ConfigReplaced { previous, config } => {
                info!(gen = previous, new_gen = config.generation, "UpdateConfig called");
                self.dump(config);
            }
            StoreEvent::UpdateRejected {
                current,
                proposed,
                reason,
            } => {
                warn!(gen = current, proposed, reason, "UpdateConfig rejected");
            }
        }
    }
}
