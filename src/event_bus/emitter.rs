use std::sync::Arc;
use thiserror::Error;

use super::event::Event;
use super::hub::EventHub;

/// Cloneable handle nodes and the runtime use to publish events.
///
/// Emission is synchronous and never blocks: the event is queued for the
/// sink listener over an unbounded channel and simultaneously broadcast to
/// any live subscriber streams. An emitter stays valid for the lifetime of
/// the [`EventBus`](super::EventBus) it came from; once the bus is dropped,
/// emission fails with [`EmitterError::Closed`].
#[derive(Clone, Debug)]
pub struct BusEmitter {
    ingress: flume::Sender<Event>,
    hub: Arc<EventHub>,
}

impl BusEmitter {
    pub(super) fn new(ingress: flume::Sender<Event>, hub: Arc<EventHub>) -> Self {
        Self { ingress, hub }
    }

    /// Publish an event to the bus.
    ///
    /// Delivery to subscribers is best-effort: an event emitted while no
    /// subscriber stream exists is still handed to the sinks, and the
    /// absence of subscribers is not an error.
    pub fn emit(&self, event: Event) -> Result<(), EmitterError> {
        self.ingress
            .send(event.clone())
            .map_err(|_| EmitterError::Closed)?;
        // No subscribers (or an already-closed hub) is fine; sinks got it.
        let _ = self.hub.publish(event);
        Ok(())
    }
}

/// Errors that can occur when emitting an event.
#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("event bus closed")]
    Closed,
}
