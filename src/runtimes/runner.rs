use crate::app::{App, BarrierOutcome};
use crate::channels::Channel;
use crate::channels::errors::{ErrorEvent, ErrorScope, LadderError};
use crate::control::{FrontierCommand, NodeRoute};
use crate::event_bus::{Event, EventBus, EventStream, STREAM_END_SCOPE};
use crate::node::NodePartial;
use crate::schedulers::{Scheduler, SchedulerError, SchedulerState};
use crate::state::VersionedState;
use crate::types::NodeKind;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::instrument;

/// Result of executing one superstep in a session.
///
/// The embedded [`BarrierOutcome`] carries the canonical ordering of
/// updates/errors so callers can log and assert without drift.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: u64,
    pub ran_nodes: Vec<NodeKind>,
    pub skipped_nodes: Vec<NodeKind>,
    pub barrier_outcome: BarrierOutcome,
    pub next_frontier: Vec<NodeKind>,
    pub state_versions: StateVersions,
    pub completed: bool,
}

/// Snapshot of channel versions for tracking state evolution.
#[derive(Debug, Clone)]
pub struct StateVersions {
    pub messages_version: u32,
    pub extra_version: u32,
    pub errors_version: u32,
}

impl StateVersions {
    fn of(state: &VersionedState) -> Self {
        Self {
            messages_version: state.messages.version(),
            extra_version: state.extra.version(),
            errors_version: state.errors.version(),
        }
    }
}

/// Per-session execution state held by the runner between steps.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: VersionedState,
    pub step: u64,
    pub frontier: Vec<NodeKind>,
    pub scheduler: Scheduler,
    pub scheduler_state: SchedulerState,
}

/// Options for step execution.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    pub interrupt_before: Vec<NodeKind>,
    pub interrupt_after: Vec<NodeKind>,
    pub interrupt_each_step: bool,
}

/// Where execution stopped when a step paused.
#[derive(Debug, Clone)]
pub enum PausedReason {
    BeforeNode(NodeKind),
    AfterNode(NodeKind),
    AfterStep(u64),
}

/// Extended step report when execution is paused.
#[derive(Debug, Clone)]
pub struct PausedReport {
    pub session_state: SessionState,
    pub reason: PausedReason,
}

/// Result of attempting to run a step.
#[derive(Debug, Clone)]
pub enum StepResult {
    Completed(StepReport),
    Paused(PausedReport),
}

/// Outcome from scheduler after normalization (ordered partials).
struct SchedulerOutcome {
    ran_nodes: Vec<NodeKind>,
    skipped_nodes: Vec<NodeKind>,
    partials: Vec<NodePartial>,
}

enum StreamEndReason {
    Completed { step: u64 },
    Error { step: Option<u64>, error: String },
}

/// Runtime execution engine for agent graphs with session management and
/// event streaming.
///
/// `AppRunner` wraps an [`App`] and owns the runtime environment around it:
/// sessions (isolated runs keyed by id), the [`EventBus`] that nodes emit
/// into, and step-level control (pausing, resuming, interrupting).
///
/// The split matters for servers: one `App` per registered agent is built at
/// startup and cloned per request into a fresh runner, so every HTTP client
/// gets its own event bus and the streams never interleave.
///
/// # Examples
///
/// ```rust,no_run
/// # use agentloom::app::App;
/// use agentloom::event_bus::EventBus;
/// use agentloom::runtimes::AppRunner;
/// use agentloom::state::VersionedState;
/// # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
/// let bus = EventBus::default();
/// let mut events = bus.subscribe();
/// let mut runner = AppRunner::with_bus(app, bus);
///
/// let session_id = "client-123".to_string();
/// runner.create_session(
///     session_id.clone(),
///     VersionedState::new_with_user_message("Hello"),
/// ).await?;
///
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("event: {event}");
///     }
/// });
///
/// runner.run_until_complete(&session_id).await?;
/// # Ok(())
/// # }
/// ```
pub struct AppRunner {
    app: Arc<App>,
    sessions: FxHashMap<String, SessionState>,
    event_bus: EventBus,
    event_stream_taken: bool,
}

/// Whether `create_session` started a fresh run or found one in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInit {
    Fresh,
    Resumed { checkpoint_step: u64 },
}

#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("session not found: {session_id}")]
    #[diagnostic(code(agentloom::runner::session_not_found))]
    SessionNotFound { session_id: String },

    #[error("no nodes to run from START (empty frontier)")]
    #[diagnostic(
        code(agentloom::runner::no_start_nodes),
        help("Add edges from Start or set the entry node correctly.")
    )]
    NoStartNodes,

    #[error("unexpected pause during run_until_complete")]
    #[diagnostic(code(agentloom::runner::unexpected_pause))]
    UnexpectedPause,

    #[error("agent task join error: {0}")]
    #[diagnostic(code(agentloom::runner::join))]
    Join(#[from] JoinError),

    #[error("app barrier error: {0}")]
    #[diagnostic(code(agentloom::runner::barrier))]
    AppBarrier(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    #[diagnostic(code(agentloom::runner::scheduler))]
    Scheduler(#[from] SchedulerError),
}

impl AppRunner {
    /// Create a runner with the event bus described by the app's runtime
    /// config (stdout sink by default). Used internally by
    /// [`App::invoke()`](crate::app::App::invoke).
    #[must_use]
    pub fn new(app: App) -> Self {
        let bus = app.runtime_config().event_bus.build_event_bus();
        Self::with_bus(app, bus)
    }

    /// Create a runner around a preconfigured [`EventBus`].
    ///
    /// This is the entry point for per-request isolation: build a bus,
    /// subscribe to it (or attach sinks), then hand it to the runner so
    /// every event from this run lands on your stream and nowhere else.
    /// The bus listener is started immediately.
    #[must_use]
    pub fn with_bus(app: App, event_bus: EventBus) -> Self {
        event_bus.listen_for_events();
        Self {
            app: Arc::new(app),
            sessions: FxHashMap::default(),
            event_bus,
            event_stream_taken: false,
        }
    }

    /// Subscribe to the underlying event stream.
    ///
    /// Returns a handle that yields events as they are emitted by nodes.
    /// Subsequent calls after the first return `None` until the stream is
    /// finalized (when a session completes the runner resets the flag).
    pub fn event_stream(&mut self) -> Option<EventStream> {
        if self.event_stream_taken {
            return None;
        }
        self.event_stream_taken = true;
        Some(self.event_bus.subscribe())
    }

    /// Initialize a session with the given initial state.
    ///
    /// If a session with this id already exists its stored state is kept
    /// and `initial_state` is ignored; the caller gets
    /// [`SessionInit::Resumed`] with the step the session had reached.
    #[instrument(skip(self, initial_state, session_id), err)]
    pub async fn create_session(
        &mut self,
        session_id: String,
        initial_state: VersionedState,
    ) -> Result<SessionInit, RunnerError> {
        if let Some(existing) = self.sessions.get(&session_id) {
            return Ok(SessionInit::Resumed {
                checkpoint_step: existing.step,
            });
        }

        let frontier = self
            .app
            .edges()
            .get(&NodeKind::Start)
            .cloned()
            .unwrap_or_default();
        if frontier.is_empty() {
            return Err(RunnerError::NoStartNodes);
        }
        let default_limit = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session_state = SessionState {
            state: initial_state,
            step: 0,
            frontier,
            scheduler: Scheduler::new(default_limit),
            scheduler_state: SchedulerState::default(),
        };
        self.sessions.insert(session_id, session_state);
        Ok(SessionInit::Fresh)
    }

    /// Execute one superstep for the given session.
    #[instrument(skip(self, options), err)]
    pub async fn run_step(
        &mut self,
        session_id: &str,
        options: StepOptions,
    ) -> Result<StepResult, RunnerError> {
        // Capture minimal snapshots without cloning the full session.
        let (current_step, current_frontier, current_versions) = {
            let current_session_state =
                self.sessions
                    .get(session_id)
                    .ok_or_else(|| RunnerError::SessionNotFound {
                        session_id: session_id.to_string(),
                    })?;
            (
                current_session_state.step,
                current_session_state.frontier.clone(),
                StateVersions::of(&current_session_state.state),
            )
        };

        // Check if already completed
        if current_frontier.is_empty() || current_frontier.iter().all(|n| *n == NodeKind::End) {
            return Ok(StepResult::Completed(StepReport {
                step: current_step,
                ran_nodes: vec![],
                skipped_nodes: current_frontier.clone(),
                barrier_outcome: BarrierOutcome::default(),
                next_frontier: vec![],
                state_versions: current_versions,
                completed: true,
            }));
        }

        // Check for interrupt_before
        for node in &current_frontier {
            if options.interrupt_before.contains(node) {
                let session_state = self
                    .sessions
                    .get(session_id)
                    .expect("session exists after initial lookup")
                    .clone();
                return Ok(StepResult::Paused(PausedReport {
                    session_state,
                    reason: PausedReason::BeforeNode(node.clone()),
                }));
            }
        }

        // Take ownership of session state for execution (eliminates full clone)
        let mut session_state = self
            .sessions
            .remove(session_id)
            .expect("session exists after initial lookup");

        // Execute one superstep; on error, record an ErrorEvent and rethrow
        let step_report = match self.run_one_superstep(&mut session_state).await {
            Ok(rep) => rep,
            Err(e) => {
                let event = match &e {
                    RunnerError::Scheduler(source) => match source {
                        SchedulerError::NodeRun { kind, step, source } => ErrorEvent {
                            when: chrono::Utc::now(),
                            scope: ErrorScope::Node {
                                kind: kind.encode().to_string(),
                                step: *step,
                            },
                            error: LadderError::msg(format!("{source}")),
                            tags: vec!["node".into()],
                            context: serde_json::json!({}),
                        },
                        SchedulerError::Join(_) => ErrorEvent {
                            when: chrono::Utc::now(),
                            scope: ErrorScope::Scheduler {
                                step: session_state.step,
                            },
                            error: LadderError::msg(format!("{e}")),
                            tags: vec!["scheduler".into()],
                            context: serde_json::json!({}),
                        },
                    },
                    _ => ErrorEvent {
                        when: chrono::Utc::now(),
                        scope: ErrorScope::Runner {
                            session: session_id.to_string(),
                            step: session_state.step,
                        },
                        error: LadderError::msg(format!("{e}")),
                        tags: vec!["runner".into()],
                        context: serde_json::json!({
                            "frontier": session_state.frontier.iter().map(|k| k.encode()).collect::<Vec<_>>()
                        }),
                    },
                };
                // Inject via barrier mechanics so the errors channel and its
                // version update the same way node-produced errors do.
                let mut update_state = session_state.state.clone();
                let partial = NodePartial {
                    messages: None,
                    extra: None,
                    errors: Some(vec![event]),
                    frontier: None,
                };
                let _ = self
                    .app
                    .apply_barrier(&mut update_state, &[], vec![partial])
                    .await;
                session_state.state = update_state;
                // Save back so callers can inspect accumulated errors
                self.sessions.insert(session_id.to_string(), session_state);
                return Err(e);
            }
        };

        // Evaluate post-execution interrupts BEFORE reinserting to minimize
        // clones. If an interrupt triggers, a clone stays in the sessions map
        // and the original moves into the PausedReport.
        if let Some(node) = step_report
            .ran_nodes
            .iter()
            .find(|n| options.interrupt_after.contains(n))
        {
            let persisted = session_state.clone();
            self.sessions.insert(session_id.to_string(), persisted);
            return Ok(StepResult::Paused(PausedReport {
                session_state,
                reason: PausedReason::AfterNode(node.clone()),
            }));
        }
        if options.interrupt_each_step {
            let persisted = session_state.clone();
            self.sessions.insert(session_id.to_string(), persisted);
            return Ok(StepResult::Paused(PausedReport {
                session_state,
                reason: PausedReason::AfterStep(step_report.step),
            }));
        }

        // Normal completion path: reinsert owned session_state directly
        self.sessions.insert(session_id.to_string(), session_state);
        Ok(StepResult::Completed(step_report))
    }

    /// Schedule one step: invoke scheduler and normalize outputs to ordered
    /// partials.
    #[inline]
    async fn schedule_step(
        &self,
        session_state: &mut SessionState,
        step: u64,
    ) -> Result<SchedulerOutcome, RunnerError> {
        let snapshot = session_state.state.snapshot();
        let result = session_state
            .scheduler
            .superstep(
                &mut session_state.scheduler_state,
                self.app.nodes(),
                session_state.frontier.clone(),
                snapshot.clone(),
                step,
                self.event_bus.get_emitter(),
            )
            .await?;

        let mut partials_by_kind: FxHashMap<NodeKind, NodePartial> = FxHashMap::default();
        for (k, partial) in result.outputs {
            partials_by_kind.insert(k, partial);
        }
        let executed_nodes = result.ran_nodes.clone();
        let partials = executed_nodes
            .iter()
            .cloned()
            .filter_map(|k| partials_by_kind.remove(&k))
            .collect();

        Ok(SchedulerOutcome {
            ran_nodes: executed_nodes,
            skipped_nodes: result.skipped_nodes,
            partials,
        })
    }

    /// Apply barrier and update session state with the results.
    #[tracing::instrument(skip(self, session_state, partials, ran), err)]
    async fn apply_barrier_and_update(
        &self,
        session_state: &mut SessionState,
        ran: &[NodeKind],
        partials: Vec<NodePartial>,
    ) -> Result<BarrierOutcome, RunnerError> {
        let mut update_state = session_state.state.clone();
        let outcome = self
            .app
            .apply_barrier(&mut update_state, ran, partials)
            .await
            .map_err(RunnerError::AppBarrier)?;
        session_state.state = update_state;
        Ok(outcome)
    }

    /// Compute next frontier from barrier outcome, resolving commands and
    /// conditional edges.
    #[inline]
    fn compute_next_frontier(
        &self,
        session_state: &SessionState,
        ran: &[NodeKind],
        barrier: &BarrierOutcome,
        step: u64,
    ) -> Vec<NodeKind> {
        let mut next_frontier: Vec<NodeKind> = Vec::new();
        let graph_edges = self.app.edges();
        let conditional_edges = self.app.conditional_edges();
        let state_snapshot = session_state.state.snapshot();

        let mut frontier_commands_by_node: FxHashMap<NodeKind, Vec<FrontierCommand>> =
            FxHashMap::default();
        for (origin, command) in &barrier.frontier_commands {
            frontier_commands_by_node
                .entry(origin.clone())
                .or_default()
                .push(command.clone());
        }

        for id in ran.iter() {
            let default_edges = graph_edges.get(id).cloned().unwrap_or_default();
            let mut next_targets: Vec<NodeKind> = Vec::new();
            let mut frontier_replaced = false;

            if let Some(commands) = frontier_commands_by_node.get(id) {
                // Commands are processed in emission order to preserve
                // author intent.
                for command in commands {
                    match command {
                        FrontierCommand::Replace(entries) => {
                            if frontier_replaced {
                                tracing::warn!(
                                    step,
                                    origin = %id.encode(),
                                    target = %entries.iter().fold(String::new(),
                                        |acc, e| format!("{} + {}", acc, e.to_node_kind())
                                    ),
                                    "Replace frontier command has been issued once already during this step, skipping."
                                );
                                continue;
                            }
                            next_targets = entries.iter().map(NodeRoute::to_node_kind).collect();
                            frontier_replaced = true;
                        }
                        FrontierCommand::Append(entries) => {
                            if next_targets.is_empty() && !frontier_replaced {
                                next_targets.extend(default_edges.clone());
                            }
                            next_targets.extend(entries.iter().map(NodeRoute::to_node_kind));
                        }
                    }
                }

                if next_targets.is_empty() && !frontier_replaced {
                    next_targets.extend(default_edges.clone());
                }
            } else {
                next_targets.extend(default_edges.clone());
            }

            if !frontier_replaced {
                for conditional_edge in conditional_edges.iter().filter(|ce| ce.from() == id) {
                    tracing::debug!(from = ?conditional_edge.from(), step, "evaluating conditional edge");
                    let target_node_names = (conditional_edge.predicate())(state_snapshot.clone());

                    for target_name in target_node_names {
                        let target = if target_name == "End" {
                            NodeKind::End
                        } else if target_name == "Start" {
                            NodeKind::Start
                        } else {
                            NodeKind::Custom(target_name.clone())
                        };

                        tracing::debug!(target = ?target, step, "conditional edge routed");

                        next_targets.push(target);
                    }
                }
            }

            for target in next_targets {
                let is_valid_target = match &target {
                    NodeKind::End | NodeKind::Start => true,
                    NodeKind::Custom(_) => self.app.nodes().contains_key(&target),
                };

                if is_valid_target {
                    if !next_frontier.contains(&target) {
                        next_frontier.push(target);
                    }
                } else {
                    tracing::warn!(
                        step,
                        origin = %id.encode(),
                        target = %target.encode(),
                        "frontier target not found; skipping"
                    );
                }
            }
        }

        next_frontier
    }

    /// Execute exactly one superstep on the given session state.
    ///
    /// Applies barrier outcomes (including frontier commands) and returns
    /// the updated step report with deterministic routing decisions.
    #[instrument(skip(self, session_state), err)]
    async fn run_one_superstep(
        &self,
        session_state: &mut SessionState,
    ) -> Result<StepReport, RunnerError> {
        session_state.step += 1;
        let step = session_state.step;

        tracing::debug!(step, "starting superstep");

        // Phase 1: schedule and normalize outputs
        let schedule_span = tracing::info_span!(
            "schedule",
            step,
            frontier_len = session_state.frontier.len()
        );
        let scheduler_outcome = schedule_span
            .in_scope(|| self.schedule_step(session_state, step))
            .await?;

        // Phase 2: apply barrier and update state
        let errors_in_partials = scheduler_outcome
            .partials
            .iter()
            .filter_map(|p| p.errors.as_ref())
            .map(|e| e.len())
            .sum::<usize>();
        let barrier_span = tracing::info_span!(
            "barrier",
            ran_nodes_len = scheduler_outcome.ran_nodes.len(),
            errors_in_partials
        );
        let barrier_outcome = barrier_span
            .in_scope(|| {
                self.apply_barrier_and_update(
                    session_state,
                    &scheduler_outcome.ran_nodes,
                    scheduler_outcome.partials,
                )
            })
            .await?;

        // Phase 3: compute next frontier
        let commands_count = barrier_outcome.frontier_commands.len();
        let conditional_edges_evaluated = self.app.conditional_edges().len();
        let frontier_span =
            tracing::info_span!("frontier", commands_count, conditional_edges_evaluated);
        let next_frontier = frontier_span.in_scope(|| {
            self.compute_next_frontier(
                session_state,
                &scheduler_outcome.ran_nodes,
                &barrier_outcome,
                step,
            )
        });

        tracing::debug!(
            step,
            updated_channels = ?barrier_outcome.updated_channels,
            error_count = barrier_outcome.errors.len(),
            "barrier applied"
        );
        tracing::debug!(step, next_frontier = ?next_frontier, "computed next frontier");

        let completed =
            next_frontier.is_empty() || next_frontier.iter().all(|n| *n == NodeKind::End);

        // Update session state
        session_state.frontier = next_frontier.clone();

        let state_versions = StateVersions::of(&session_state.state);

        Ok(StepReport {
            step,
            ran_nodes: scheduler_outcome.ran_nodes,
            skipped_nodes: scheduler_outcome.skipped_nodes,
            barrier_outcome,
            next_frontier,
            state_versions,
            completed,
        })
    }

    /// Run until completion (End nodes or no frontier), the canonical
    /// execution method.
    #[instrument(skip(self, session_id), err)]
    pub async fn run_until_complete(
        &mut self,
        session_id: &str,
    ) -> Result<VersionedState, RunnerError> {
        tracing::info!(session = %session_id, "agent run started");

        loop {
            // Check if we're done before trying to run
            let session_state =
                self.sessions
                    .get(session_id)
                    .ok_or_else(|| RunnerError::SessionNotFound {
                        session_id: session_id.to_string(),
                    })?;

            if self.is_session_complete(session_state) {
                tracing::info!(
                    session = %session_id,
                    step = session_state.step,
                    "frontier reached terminal state"
                );
                break;
            }

            let step_result = match self.run_step(session_id, StepOptions::default()).await {
                Ok(res) => res,
                Err(err) => {
                    let reason = err.to_string();
                    let step = self.sessions.get(session_id).map(|state| state.step);
                    self.finalize_event_stream(
                        session_id,
                        StreamEndReason::Error {
                            step,
                            error: reason,
                        },
                    );
                    return Err(err);
                }
            };

            match step_result {
                StepResult::Completed(report) => {
                    if report.completed {
                        break;
                    }
                }
                StepResult::Paused(_) => {
                    // Should not happen with default options; surface it
                    let step = self.sessions.get(session_id).map(|state| state.step);
                    self.finalize_event_stream(
                        session_id,
                        StreamEndReason::Error {
                            step,
                            error: "execution paused unexpectedly".to_string(),
                        },
                    );
                    return Err(RunnerError::UnexpectedPause);
                }
            }
        }

        tracing::info!(session = %session_id, "agent run completed");
        let (final_state, versions, final_step) = self.finalize_state_snapshot(session_id)?;
        let messages_snapshot = final_state.messages.snapshot();
        let extra_snapshot = final_state.extra.snapshot();

        for (i, m) in messages_snapshot.iter().enumerate() {
            tracing::debug!(
                session = %session_id,
                message_index = i,
                role = %m.role,
                content = %m.content,
                "final message snapshot entry"
            );
        }
        tracing::debug!(
            session = %session_id,
            messages_version = versions.messages_version,
            "messages channel version"
        );

        tracing::debug!(
            session = %session_id,
            extra_version = versions.extra_version,
            keys = extra_snapshot.len(),
            "extra channel summary"
        );
        for (k, v) in extra_snapshot.iter() {
            tracing::debug!(
                session = %session_id,
                key = %k,
                value = %v,
                "final extra entry"
            );
        }

        self.finalize_event_stream(session_id, StreamEndReason::Completed { step: final_step });
        Ok(final_state)
    }

    /// Get a snapshot of the current session state.
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Option<&SessionState> {
        self.sessions.get(session_id)
    }

    /// List all active session IDs.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<&String> {
        self.sessions.keys().collect()
    }
}

impl AppRunner {
    /// Determine if a session has reached a terminal frontier (no work or
    /// only End nodes).
    #[inline]
    fn is_session_complete(&self, session_state: &SessionState) -> bool {
        session_state.frontier.is_empty()
            || session_state.frontier.iter().all(|n| *n == NodeKind::End)
    }

    /// Return the final state clone, channel versions, and last step for
    /// the session.
    #[inline]
    fn finalize_state_snapshot(
        &self,
        session_id: &str,
    ) -> Result<(VersionedState, StateVersions, u64), RunnerError> {
        let session_state =
            self.sessions
                .get(session_id)
                .ok_or_else(|| RunnerError::SessionNotFound {
                    session_id: session_id.to_string(),
                })?;

        let final_state = session_state.state.clone();
        let state_versions = StateVersions::of(&final_state);
        let final_step = session_state.step;
        Ok((final_state, state_versions, final_step))
    }

    fn finalize_event_stream(&mut self, session_id: &str, reason: StreamEndReason) {
        let message = match reason {
            StreamEndReason::Completed { step } => {
                format!("session={session_id} status=completed step={step}")
            }
            StreamEndReason::Error { step, error } => step
                .map(|s| format!("session={session_id} status=error step={s} error={error}"))
                .unwrap_or_else(|| format!("session={session_id} status=error error={error}")),
        };

        if let Err(err) = self
            .event_bus
            .get_emitter()
            .emit(Event::diagnostic(STREAM_END_SCOPE, message.clone()))
        {
            tracing::debug!(
                session = %session_id,
                scope = STREAM_END_SCOPE,
                completion_message = %message,
                error = ?err,
                "failed to emit stream termination event"
            );
        }

        if self.event_stream_taken {
            self.event_bus.close_channel();
            self.event_stream_taken = false;
        }
    }
}
