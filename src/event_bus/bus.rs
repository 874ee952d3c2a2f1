use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::oneshot, task};

use super::emitter::BusEmitter;
use super::event::Event;
use super::hub::{EventHub, EventStream};
use super::sink::{EventSink, StdOutSink};

/// Broadcast buffer size used when no explicit capacity is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Receives events from emitters and delivers them on two paths: queued
/// fan-out to the configured sinks, and live broadcast to subscriber
/// streams.
///
/// Sinks only see events while the background listener started by
/// [`EventBus::listen_for_events`] is running (plus whatever
/// [`EventBus::stop_listener`] drains). Subscribers receive events as soon
/// as they are emitted, listener or not, which is what lets SSE handlers
/// stream a run without caring about sink lifecycle.
pub struct EventBus {
    ingress_tx: flume::Sender<Event>,
    ingress_rx: flume::Receiver<Event>,
    hub: Arc<EventHub>,
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    listener: Mutex<Option<ListenerState>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl EventBus {
    /// Create an `EventBus` with a single sink.
    pub fn with_sink<T>(sink: T) -> Self
    where
        T: EventSink + 'static,
    {
        Self::with_sinks(vec![Box::new(sink)])
    }

    /// Create an `EventBus` with multiple sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self::with_capacity_and_sinks(DEFAULT_CHANNEL_CAPACITY, sinks)
    }

    /// Create an `EventBus` with an explicit subscriber buffer capacity.
    ///
    /// Subscribers that fall more than `capacity` events behind start
    /// losing the oldest ones; losses are tallied in
    /// [`EventBus::dropped_events`].
    pub fn with_capacity_and_sinks(capacity: usize, sinks: Vec<Box<dyn EventSink>>) -> Self {
        let (ingress_tx, ingress_rx) = flume::unbounded();
        Self {
            ingress_tx,
            ingress_rx,
            hub: EventHub::new(capacity),
            sinks: Arc::new(Mutex::new(sinks)),
            listener: Mutex::new(None),
        }
    }

    /// Dynamically add a sink (useful for per-request capture).
    ///
    /// # Example
    /// ```no_run
    /// use tokio::sync::mpsc;
    /// use agentloom::event_bus::{EventBus, ChannelSink};
    ///
    /// let bus = EventBus::default();
    /// bus.listen_for_events();
    ///
    /// let (tx, rx) = mpsc::unbounded_channel();
    /// bus.add_sink(ChannelSink::new(tx));
    /// // Events now go to both stdout and the channel.
    /// ```
    pub fn add_sink<T: EventSink + 'static>(&self, sink: T) {
        self.sinks.lock().push(Box::new(sink));
    }

    /// Add an already-boxed sink, as produced by sink configuration.
    pub fn add_boxed_sink(&self, sink: Box<dyn EventSink>) {
        self.sinks.lock().push(sink);
    }

    /// Handle producers use to publish events onto this bus.
    pub fn get_emitter(&self) -> Arc<BusEmitter> {
        Arc::new(BusEmitter::new(
            self.ingress_tx.clone(),
            Arc::clone(&self.hub),
        ))
    }

    /// Open a live stream over events emitted from now on.
    pub fn subscribe(&self) -> EventStream {
        self.hub.subscribe()
    }

    /// Close the subscriber side of the bus. Existing streams end once
    /// drained; sinks keep receiving until the listener stops.
    pub fn close_channel(&self) {
        self.hub.close();
    }

    /// Number of events lost to subscriber lag.
    pub fn dropped_events(&self) -> usize {
        self.hub.dropped()
    }

    /// Spawn a background task that forwards queued events to all sinks.
    /// Idempotent: calling it again while a listener runs has no effect.
    pub fn listen_for_events(&self) {
        let mut guard = self.listener.lock();
        if guard.is_some() {
            return;
        }

        let receiver = self.ingress_rx.clone();
        let sinks = Arc::clone(&self.sinks);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = receiver.recv_async() => match recv {
                        Err(e) => {
                            eprintln!("EventBus receiver error: {e}");
                            break;
                        }
                        Ok(event) => {
                            let mut sinks_guard = sinks.lock();
                            for sink in sinks_guard.iter_mut() {
                                if let Err(e) = sink.handle(&event) {
                                    eprintln!("EventBus sink error: {e}");
                                }
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener and flush any still-queued events to
    /// the sinks.
    pub async fn stop_listener(&self) {
        let state = { self.listener.lock().take() };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }

        let mut sinks = self.sinks.lock();
        while let Ok(event) = self.ingress_rx.try_recv() {
            for sink in sinks.iter_mut() {
                if let Err(e) = sink.handle(&event) {
                    eprintln!("EventBus sink error: {e}");
                }
            }
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Some(state) = self.listener.lock().take() {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
        // Terminate subscriber streams that would otherwise wait forever.
        self.hub.close();
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}
