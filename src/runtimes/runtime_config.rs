use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};

/// Per-app runtime settings consulted when an invocation starts.
///
/// `session_id: None` (the default) makes every invocation generate a fresh
/// run id, which is what servers want; pinning an id lets a caller resume
/// the same in-memory session across `run_until_complete` calls on one
/// runner.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub session_id: Option<String>,
    pub event_bus: EventBusConfig,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            session_id,
            event_bus: EventBusConfig::default(),
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }

    #[must_use]
    pub fn with_stdout_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_stdout_only())
    }

    /// Capture events into the given sink alongside stdout. The caller
    /// keeps a clone of the sink and reads
    /// [`MemorySink::snapshot`](crate::event_bus::MemorySink::snapshot)
    /// after the run.
    #[must_use]
    pub fn with_memory_event_bus(self, sink: MemorySink) -> Self {
        self.with_event_bus(EventBusConfig::with_memory_sink(sink))
    }
}

/// Declarative sink selection for [`EventBusConfig`].
#[derive(Clone, Debug)]
pub enum SinkConfig {
    StdOut,
    Memory(MemorySink),
}

impl SinkConfig {
    fn build(&self) -> Box<dyn EventSink> {
        match self {
            SinkConfig::StdOut => Box::new(StdOutSink::default()),
            // Cloning shares the underlying buffer with the configured
            // handle, so captured events stay visible to the caller.
            SinkConfig::Memory(sink) => Box::new(sink.clone()),
        }
    }
}

/// Blueprint for the [`EventBus`] built at invocation time.
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub buffer_capacity: usize,
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new(buffer_capacity: usize, sinks: Vec<SinkConfig>) -> Self {
        Self {
            buffer_capacity: if buffer_capacity == 0 {
                Self::DEFAULT_BUFFER_CAPACITY
            } else {
                buffer_capacity
            },
            sinks,
        }
    }

    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self::new(Self::DEFAULT_BUFFER_CAPACITY, vec![SinkConfig::StdOut])
    }

    #[must_use]
    pub fn with_memory_sink(sink: MemorySink) -> Self {
        Self::new(
            Self::DEFAULT_BUFFER_CAPACITY,
            vec![SinkConfig::StdOut, SinkConfig::Memory(sink)],
        )
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn sinks(&self) -> &[SinkConfig] {
        &self.sinks
    }

    /// Materialize an [`EventBus`] from this blueprint.
    #[must_use]
    pub fn build_event_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self.sinks.iter().map(SinkConfig::build).collect();
        EventBus::with_capacity_and_sinks(self.buffer_capacity, sinks)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}
