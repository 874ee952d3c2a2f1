use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::channels::Channel;
use crate::channels::errors::{ErrorEvent, ErrorScope};
use crate::control::FrontierCommand;
use crate::event_bus::{EventBus, EventStream};
use crate::message::*;
use crate::node::*;
use crate::reducers::ReducerRegistry;
use crate::runtimes::runner::RunnerError;
use crate::runtimes::{AppRunner, RuntimeConfig, SessionInit};
use crate::state::*;
use crate::types::*;
use crate::utils::collections::new_extra_map;
use crate::utils::id_generator::IdGenerator;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Orchestrates graph execution and applies reducers at barriers.
///
/// `App` is the coordination point for a compiled agent graph, holding:
/// - the node registry and edge topology (plain and conditional)
/// - the reducer registry used at every barrier
/// - the runtime configuration (session naming, event bus sinks)
///
/// # Examples
///
/// ```rust,no_run
/// use agentloom::graphs::GraphBuilder;
/// use agentloom::state::VersionedState;
/// use agentloom::types::NodeKind;
/// use agentloom::node::{Node, NodeContext, NodeError, NodePartial};
/// use async_trait::async_trait;
///
/// # struct MyNode;
/// # #[async_trait]
/// # impl Node for MyNode {
/// #     async fn run(&self, _: agentloom::state::StateSnapshot, _: NodeContext) -> Result<NodePartial, NodeError> {
/// #         Ok(NodePartial::default())
/// #     }
/// # }
/// #
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("chat".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
///     .add_edge(NodeKind::Custom("chat".into()), NodeKind::End)
///     .compile()?;
///
/// let initial_state = VersionedState::new_with_user_message("Hello");
/// let final_state = app.invoke(initial_state).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    conditional_edges: Vec<crate::graphs::ConditionalEdge>,
    reducer_registry: ReducerRegistry,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").finish_non_exhaustive()
    }
}

/// Combined handle exposing the configured event bus and a single
/// subscription.
///
/// Obtained from [`App::event_stream()`], it lets callers attach additional
/// sinks before execution starts or choose how to consume the broadcast
/// feed.
pub struct AppEventStream {
    event_bus: EventBus,
    event_stream: Option<EventStream>,
}

/// Errors returned when accessing an [`AppEventStream`] after its
/// subscription has already been consumed.
#[derive(Debug, Error)]
pub enum AppEventStreamError {
    #[error("event stream has already been taken")]
    AlreadyTaken,
}

type AppEventStreamResult<T> = Result<T, AppEventStreamError>;

/// Handle for a streaming graph invocation.
///
/// Dropping the handle aborts the run. Use [`join`](InvocationHandle::join)
/// to await graceful completion; the paired event stream emits a diagnostic
/// with scope [`STREAM_END_SCOPE`](crate::event_bus::STREAM_END_SCOPE)
/// before closing.
pub struct InvocationHandle {
    join_handle: Option<JoinHandle<Result<VersionedState, RunnerError>>>,
}

/// Result of applying node partials at a barrier.
///
/// The outcome aggregates channel and error information in a deterministic
/// order so downstream consumers (runner, tests) observe stable behaviour
/// across executions.
#[derive(Debug, Clone, Default)]
pub struct BarrierOutcome {
    /// Channel identifiers that were updated during the barrier.
    pub updated_channels: Vec<&'static str>,
    /// Aggregated error events emitted by nodes in the superstep.
    pub errors: Vec<ErrorEvent>,
    /// Frontier manipulation commands emitted during the barrier.
    pub frontier_commands: Vec<(NodeKind, FrontierCommand)>,
}

impl AppEventStream {
    fn new(event_bus: EventBus, event_stream: EventStream) -> Self {
        Self {
            event_bus,
            event_stream: Some(event_stream),
        }
    }

    /// Access the bus to add sinks before execution begins.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Mutable access to the underlying broadcast subscription.
    ///
    /// Returns an error if the stream was already consumed by another
    /// accessor.
    pub fn event_stream(&mut self) -> AppEventStreamResult<&mut EventStream> {
        self.event_stream
            .as_mut()
            .ok_or(AppEventStreamError::AlreadyTaken)
    }

    /// Consume the handle and return the raw event stream.
    pub fn into_stream(mut self) -> AppEventStreamResult<EventStream> {
        self.event_stream
            .take()
            .ok_or(AppEventStreamError::AlreadyTaken)
    }

    /// Consume the handle and return the event bus.
    pub fn into_event_bus(self) -> EventBus {
        self.event_bus
    }

    /// Split the handle into the bus and event stream.
    pub fn split(mut self) -> AppEventStreamResult<(EventBus, EventStream)> {
        let stream = self
            .event_stream
            .take()
            .ok_or(AppEventStreamError::AlreadyTaken)?;
        Ok((self.event_bus, stream))
    }

    /// Consume and convert the stream into an async stream.
    pub fn into_async_stream(
        self,
    ) -> AppEventStreamResult<BoxStream<'static, crate::event_bus::Event>> {
        Ok(self.into_stream()?.into_async_stream().boxed())
    }

    /// Await the next event with a timeout, skipping lag notifications.
    pub async fn next_timeout(
        &mut self,
        duration: std::time::Duration,
    ) -> AppEventStreamResult<Option<crate::event_bus::Event>> {
        Ok(self.event_stream()?.next_timeout(duration).await)
    }
}

impl InvocationHandle {
    /// Abort the underlying task. `join` will return a join error
    /// afterwards. Equivalent to dropping the handle explicitly.
    pub fn abort(&self) {
        if let Some(handle) = &self.join_handle {
            handle.abort();
        }
    }

    /// Returns true once the underlying task has completed or aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Await the run result.
    pub async fn join(mut self) -> Result<VersionedState, RunnerError> {
        let handle = self
            .join_handle
            .take()
            .expect("join_handle already awaited");
        match handle.await {
            Ok(result) => result,
            Err(err) => Err(RunnerError::Join(err)),
        }
    }
}

impl Drop for InvocationHandle {
    fn drop(&mut self) {
        if let Some(handle) = &self.join_handle {
            handle.abort();
        }
    }
}

impl App {
    /// Internal (crate) factory to build an App while keeping nodes/edges
    /// private.
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, Vec<NodeKind>>,
        conditional_edges: Vec<crate::graphs::ConditionalEdge>,
        runtime_config: RuntimeConfig,
    ) -> Self {
        App {
            nodes,
            edges,
            conditional_edges,
            reducer_registry: ReducerRegistry::default(),
            runtime_config,
        }
    }

    /// Conditional edges in this graph.
    ///
    /// Predicates return encoded target names; "Start" and "End" map to the
    /// virtual endpoints, anything else names a custom node. Unknown targets
    /// are skipped at runtime with a warning, preserving progress.
    #[must_use]
    pub fn conditional_edges(&self) -> &Vec<crate::graphs::ConditionalEdge> {
        &self.conditional_edges
    }

    /// Registry of node implementations, keyed by `NodeKind`.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    /// Static edge topology: source node to destination nodes.
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, Vec<NodeKind>> {
        &self.edges
    }

    /// Runtime configuration for this app.
    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Create a subscription to the configured event bus without starting
    /// execution.
    ///
    /// This is the low-level entry point for inspecting the stream or
    /// registering additional sinks before running, e.g. in tests or
    /// custom server integrations.
    #[must_use]
    pub fn event_stream(&self) -> AppEventStream {
        let event_bus = self.runtime_config.event_bus.build_event_bus();
        let event_stream = event_bus.subscribe();
        AppEventStream::new(event_bus, event_stream)
    }

    /// Internal helper that centralises runner setup for the public
    /// `invoke*` helpers.
    ///
    /// `R` is any auxiliary handle the caller wants back alongside the run
    /// result (for example a `flume::Receiver<Event>` when wiring a
    /// channel); `F` constructs the `EventBus` together with that handle.
    async fn invoke_with_bus_builder<R, F>(
        &self,
        initial_state: VersionedState,
        build_event_bus: F,
    ) -> (Result<VersionedState, RunnerError>, R)
    where
        F: FnOnce() -> (EventBus, R),
    {
        let (event_bus, output) = build_event_bus();
        let runner = AppRunner::with_bus(self.clone(), event_bus);

        let session_id = self.next_session_id();
        let result = Self::run_session(runner, session_id, initial_state).await;

        (result, output)
    }

    /// Invoke the graph asynchronously while streaming events to the
    /// caller.
    ///
    /// Returns a join handle for the run outcome and an [`EventStream`]
    /// that yields every event emitted during execution. The stream closes
    /// after emitting a diagnostic with scope
    /// [`STREAM_END_SCOPE`](crate::event_bus::STREAM_END_SCOPE). Sinks
    /// configured on the runtime event bus continue to receive events.
    ///
    /// # Cancellation
    ///
    /// Dropping the [`InvocationHandle`] (or calling
    /// [`InvocationHandle::abort`]) stops the run immediately. Dropping the
    /// event stream does **not** cancel the run; use the handle when the
    /// client disconnects.
    ///
    /// ```no_run
    /// use futures_util::StreamExt;
    /// use agentloom::event_bus::STREAM_END_SCOPE;
    /// # async fn run(app: agentloom::app::App, state: agentloom::state::VersionedState) -> miette::Result<()> {
    /// let (handle, events) = app.invoke_streaming(state).await;
    ///
    /// let mut events = events.into_async_stream();
    /// tokio::spawn(async move {
    ///     while let Some(event) = events.next().await {
    ///         if event.scope_label() == Some(STREAM_END_SCOPE) {
    ///             tracing::info!("run finished");
    ///         }
    ///     }
    /// });
    ///
    /// let final_state = handle.join().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn invoke_streaming(
        &self,
        initial_state: VersionedState,
    ) -> (InvocationHandle, EventStream) {
        let event_handle = self.event_stream();
        let (event_bus, event_stream) = event_handle
            .split()
            .expect("fresh App::event_stream() should yield an unused event stream");

        let runner = AppRunner::with_bus(self.clone(), event_bus);

        let session_id = self.next_session_id();
        let join = tokio::spawn(Self::run_session(runner, session_id, initial_state));

        (
            InvocationHandle {
                join_handle: Some(join),
            },
            event_stream,
        )
    }

    /// Execute the entire graph until completion or no nodes remain.
    ///
    /// Uses the event bus defined on the `RuntimeConfig` (stdout sink by
    /// default). For streaming-first scenarios see
    /// [`invoke_streaming`](Self::invoke_streaming),
    /// [`invoke_with_channel`](Self::invoke_with_channel), or
    /// [`invoke_with_sinks`](Self::invoke_with_sinks); drop down to
    /// [`AppRunner::with_bus`](crate::runtimes::runner::AppRunner::with_bus)
    /// for per-request isolation.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use agentloom::state::VersionedState;
    /// use agentloom::channels::Channel;
    /// # use agentloom::app::App;
    /// # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
    /// let initial = VersionedState::new_with_user_message("Tell me a joke");
    /// let final_state = app.invoke(initial).await?;
    /// println!("run completed with {} messages", final_state.messages.len());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, initial_state), err)]
    pub async fn invoke(
        &self,
        initial_state: VersionedState,
    ) -> Result<VersionedState, RunnerError> {
        self.invoke_with_bus_builder(initial_state, || {
            (self.runtime_config.event_bus.build_event_bus(), ())
        })
        .await
        .0
    }

    /// Execute the graph with event streaming to a flume channel.
    ///
    /// Convenience wrapper for scripts and CLI tools that want the final
    /// state and the event feed without managing an `EventBus`. The
    /// runtime-configured sinks remain active; this helper appends a
    /// channel sink.
    ///
    /// ```rust,no_run
    /// use agentloom::state::VersionedState;
    /// # use agentloom::app::App;
    /// # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
    /// let (result, events) = app
    ///     .invoke_with_channel(VersionedState::new_with_user_message("Hi"))
    ///     .await;
    ///
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv_async().await {
    ///         println!("event: {event}");
    ///     }
    /// });
    ///
    /// let final_state = result?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, initial_state))]
    pub async fn invoke_with_channel(
        &self,
        initial_state: VersionedState,
    ) -> (
        Result<VersionedState, RunnerError>,
        flume::Receiver<crate::event_bus::Event>,
    ) {
        self.invoke_with_bus_builder(initial_state, || {
            let (tx, rx) = flume::unbounded();
            let event_bus = self.runtime_config.event_bus.build_event_bus();
            event_bus.add_sink(FlumeForwardSink { tx });
            (event_bus, rx)
        })
        .await
    }

    /// Execute the graph with additional `EventSink`s appended to the
    /// runtime-configured ones.
    ///
    /// ```rust,no_run
    /// use agentloom::event_bus::{ChannelSink, StdOutSink};
    /// use agentloom::state::VersionedState;
    /// # use agentloom::app::App;
    /// # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
    /// let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    ///
    /// let final_state = app.invoke_with_sinks(
    ///     VersionedState::new_with_user_message("Process data"),
    ///     vec![
    ///         Box::new(StdOutSink::default()),
    ///         Box::new(ChannelSink::new(tx)),
    ///     ],
    /// ).await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, initial_state, sinks), err)]
    pub async fn invoke_with_sinks(
        &self,
        initial_state: VersionedState,
        sinks: Vec<Box<dyn crate::event_bus::EventSink>>,
    ) -> Result<VersionedState, RunnerError> {
        self.invoke_with_bus_builder(initial_state, move || {
            let event_bus = self.runtime_config.event_bus.build_event_bus();
            for sink in sinks {
                event_bus.add_boxed_sink(sink);
            }
            (event_bus, ())
        })
        .await
        .0
    }

    /// Session identifier for the next invocation: the configured id when
    /// present, otherwise a random run id.
    fn next_session_id(&self) -> String {
        self.runtime_config
            .session_id
            .clone()
            .unwrap_or_else(|| IdGenerator::new().generate_run_id())
    }

    /// Drive a session to completion, resuming in-memory progress when the
    /// session id already exists.
    async fn run_session(
        mut runner: AppRunner,
        session_id: String,
        initial_state: VersionedState,
    ) -> Result<VersionedState, RunnerError> {
        let init_state = runner
            .create_session(session_id.clone(), initial_state)
            .await?;

        if let SessionInit::Resumed { checkpoint_step } = init_state {
            tracing::info!(
                session = %session_id,
                checkpoint_step,
                "Resuming existing session"
            );
        }

        runner.run_until_complete(&session_id).await
    }

    /// Merge node outputs and apply state reductions after a superstep.
    ///
    /// Coordinates the barrier phase: partials from all nodes that ran are
    /// merged in run order, applied through the reducer registry, and
    /// channel versions are bumped only where content actually changed.
    /// The returned [`BarrierOutcome`] captures updated channels,
    /// aggregated errors, and frontier commands in a stable order.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use agentloom::app::App;
    /// # use agentloom::node::NodePartial;
    /// # use agentloom::state::VersionedState;
    /// # use agentloom::types::NodeKind;
    /// # use agentloom::message::Message;
    /// # async fn example(app: App, state: &mut VersionedState) -> Result<(), String> {
    /// let partials = vec![NodePartial {
    ///     messages: Some(vec![Message::assistant("done")]),
    ///     ..Default::default()
    /// }];
    /// let outcome = app
    ///     .apply_barrier(state, &[NodeKind::Custom("chat".into())], partials)
    ///     .await
    ///     .map_err(|e| e.to_string())?;
    /// assert_eq!(outcome.updated_channels, vec!["messages"]);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, state, run_ids, node_partials), err)]
    pub async fn apply_barrier(
        &self,
        state: &mut VersionedState,
        run_ids: &[NodeKind],
        node_partials: Vec<NodePartial>,
    ) -> Result<BarrierOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut msgs_all: Vec<Message> = Vec::new();
        let mut extra_all = new_extra_map();
        let mut errors_all: Vec<ErrorEvent> = Vec::new();
        let mut frontier_commands: Vec<(NodeKind, FrontierCommand)> = Vec::new();

        for (i, p) in node_partials.iter().enumerate() {
            let fallback = NodeKind::Custom("?".to_string());
            let nid = run_ids.get(i).unwrap_or(&fallback);

            if let Some(ms) = &p.messages {
                if !ms.is_empty() {
                    tracing::debug!(node = ?nid, count = ms.len(), "Node produced messages");
                    msgs_all.extend(ms.clone());
                }
            }

            if let Some(ex) = &p.extra {
                if !ex.is_empty() {
                    tracing::debug!(node = ?nid, keys = ex.len(), "Node produced extra data");
                    // Sort keys to keep the merged map deterministic across runs.
                    let mut sorted_pairs: Vec<_> = ex.iter().collect();
                    sorted_pairs.sort_by(|(left, _), (right, _)| left.cmp(right));
                    for (k, v) in sorted_pairs {
                        extra_all.insert(k.clone(), v.clone());
                    }
                }
            }

            if let Some(errs) = &p.errors {
                if !errs.is_empty() {
                    tracing::debug!(node = ?nid, count = errs.len(), "Node produced errors");
                    errors_all.extend(errs.clone());
                }
            }

            if let Some(command) = &p.frontier {
                frontier_commands.push((nid.clone(), command.clone()));
            }
        }

        fn scope_sort_key(scope: &ErrorScope) -> (u8, &str, u64) {
            match scope {
                ErrorScope::Node { kind, step } => (0, kind.as_str(), *step),
                ErrorScope::Scheduler { step } => (1, "", *step),
                ErrorScope::Runner { session, step } => (2, session.as_str(), *step),
                ErrorScope::App => (3, "", 0),
            }
        }

        // Sort aggregated errors so downstream consumers observe a stable
        // order.
        errors_all.sort_by(|a, b| {
            let key_a = scope_sort_key(&a.scope);
            let key_b = scope_sort_key(&b.scope);
            key_a
                .cmp(&key_b)
                .then_with(|| a.when.cmp(&b.when))
                .then_with(|| a.error.message.cmp(&b.error.message))
        });

        let errors_for_state = if errors_all.is_empty() {
            None
        } else {
            Some(errors_all.clone())
        };

        let merged_updates = NodePartial {
            messages: if msgs_all.is_empty() {
                None
            } else {
                Some(msgs_all)
            },
            extra: if extra_all.is_empty() {
                None
            } else {
                Some(extra_all)
            },
            errors: errors_for_state,
            frontier: None,
        };

        // Record before-states for version bump decisions.
        let msgs_before_len = state.messages.len();
        let msgs_before_ver = state.messages.version();
        let extra_before = state.extra.snapshot();
        let extra_before_ver = state.extra.version();
        let errors_before_len = state.errors.len();
        let errors_before_ver = state.errors.version();

        // Apply reducers (they do NOT bump versions).
        self.reducer_registry
            .apply_all(&mut *state, &merged_updates)?;

        // Detect changes and bump versions only where content moved.
        let mut updated: Vec<&'static str> = Vec::new();

        let msgs_changed = state.messages.len() != msgs_before_len;
        if msgs_changed {
            state
                .messages
                .set_version(msgs_before_ver.saturating_add(1));
            tracing::info!(
                target: "agentloom::app",
                channel = "messages",
                before_count = msgs_before_len,
                after_count = state.messages.len(),
                before_version = msgs_before_ver,
                after_version = state.messages.version(),
                "channel updated"
            );
            updated.push("messages");
        }

        let extra_after = state.extra.snapshot();
        let extra_changed = extra_after != extra_before;
        if extra_changed {
            state.extra.set_version(extra_before_ver.saturating_add(1));
            tracing::info!(
                target: "agentloom::app",
                channel = "extra",
                before_count = extra_before.len(),
                after_count = extra_after.len(),
                before_version = extra_before_ver,
                after_version = state.extra.version(),
                "channel updated"
            );
            updated.push("extra");
        }

        let errors_changed = state.errors.len() != errors_before_len;
        if errors_changed {
            state
                .errors
                .set_version(errors_before_ver.saturating_add(1));
            tracing::info!(
                target: "agentloom::app",
                channel = "errors",
                before_count = errors_before_len,
                after_count = state.errors.len(),
                before_version = errors_before_ver,
                after_version = state.errors.version(),
                "channel updated"
            );
            updated.push("errors");
        }

        Ok(BarrierOutcome {
            updated_channels: updated,
            errors: errors_all,
            frontier_commands,
        })
    }
}

/// Sink that forwards events to a flume channel for
/// [`App::invoke_with_channel`]. The tokio-flavoured [`ChannelSink`] covers
/// mpsc consumers; this one keeps the flume receiver API.
struct FlumeForwardSink {
    tx: flume::Sender<crate::event_bus::Event>,
}

impl crate::event_bus::EventSink for FlumeForwardSink {
    fn handle(&mut self, event: &crate::event_bus::Event) -> std::io::Result<()> {
        self.tx.send(event.clone()).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "channel receiver dropped")
        })
    }
}
