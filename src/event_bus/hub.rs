use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::time::timeout;

use super::emitter::EmitterError;
use super::event::Event;

/// Broadcast fan-out behind the bus.
///
/// The hub owns the broadcast sender inside a `Mutex<Option<..>>` so it can
/// be closed explicitly: after [`EventHub::close`], existing subscriber
/// streams terminate once drained and new subscriptions start out closed.
#[derive(Debug)]
pub struct EventHub {
    sender: Mutex<Option<Sender<Event>>>,
    dropped_events: AtomicUsize,
    capacity: usize,
}

impl EventHub {
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            dropped_events: AtomicUsize::new(0),
            capacity,
        })
    }

    pub fn publish(&self, event: Event) -> Result<(), EmitterError> {
        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(sender) => sender.send(event).map(|_| ()).map_err(|_| EmitterError::Closed),
            None => Err(EmitterError::Closed),
        }
    }

    pub fn subscribe(self: &Arc<Self>) -> EventStream {
        let receiver = {
            let guard = self.sender.lock();
            match guard.as_ref() {
                Some(sender) => sender.subscribe(),
                None => {
                    // Subscribing after close yields a stream that reports
                    // Closed on the first recv.
                    let (sender, receiver) = broadcast::channel(1);
                    drop(sender);
                    receiver
                }
            }
        };
        EventStream {
            receiver,
            hub: Arc::clone(self),
        }
    }

    /// Drop the broadcast sender, terminating subscriber streams once they
    /// catch up.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events subscribers missed due to lag.
    pub fn dropped(&self) -> usize {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

/// Subscriber view of the bus.
///
/// Wraps a broadcast receiver and records lag against the hub's dropped
/// counter so slow consumers are visible.
#[derive(Debug)]
pub struct EventStream {
    receiver: Receiver<Event>,
    hub: Arc<EventHub>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                self.hub
                    .dropped_events
                    .fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::RecvError::Lagged(missed))
            }
            Err(err) => Err(err),
        }
    }

    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                self.hub
                    .dropped_events
                    .fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::TryRecvError::Lagged(missed))
            }
            Err(err) => Err(err),
        }
    }

    /// Adapt this stream into a `futures_util::Stream`, skipping over lag
    /// gaps and ending when the hub closes. This is what SSE handlers poll.
    pub fn into_async_stream(self) -> impl futures_util::stream::Stream<Item = Event> {
        stream::unfold(self, |mut stream| async move {
            loop {
                match stream.recv().await {
                    Ok(event) => return Some((event, stream)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Receive the next event or give up after `duration`. Lag gaps are
    /// skipped rather than surfaced.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<Event> {
        loop {
            match timeout(duration, self.recv()).await {
                Ok(Ok(event)) => return Some(event),
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
                Err(_) => return None,
            }
        }
    }
}
