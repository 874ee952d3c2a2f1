//! Event bus providing fan-out to sinks and live subscriber streams.
//!
//! The module is organised around a broadcast-based [`EventHub`], the
//! [`EventBus`] that couples it with configurable sinks, and the
//! [`EventStream`] subscribers consume. Nodes publish through the cloneable
//! [`BusEmitter`] handle.

pub mod bus;
pub mod emitter;
pub mod event;
pub mod hub;
pub mod sink;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use emitter::{BusEmitter, EmitterError};
pub use event::{DiagnosticEvent, Event, LlmOutputEvent, NodeEvent, STREAM_END_SCOPE};
pub use hub::{EventHub, EventStream};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
