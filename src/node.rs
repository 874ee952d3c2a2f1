//! Node execution framework for agent graphs.
//!
//! This module provides the core abstractions for executable graph nodes:
//! the [`Node`] trait, the execution context, partial state updates, and
//! node-level error handling.

// Standard library and external crates
use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json;
use std::sync::Arc;
use thiserror::Error;

// Internal crate modules
use crate::channels::errors::ErrorEvent;
use crate::control::{FrontierCommand, NodeRoute};
use crate::event_bus::{BusEmitter, Event};
use crate::message::Message;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

// ============================================================================
// Core Trait
// ============================================================================

/// A single unit of computation within an agent graph.
///
/// Nodes receive the current state snapshot and an execution context, do
/// their work, and return a [`NodePartial`] describing what should change.
/// They never mutate state directly.
///
/// # Error Handling
///
/// Two paths are available:
/// 1. **Fatal**: return `Err(NodeError)` to abort the run
/// 2. **Recoverable**: record an [`ErrorEvent`] in `NodePartial.errors` and
///    return `Ok`
///
/// # Examples
///
/// ```rust,no_run
/// use agentloom::node::{Node, NodeContext, NodePartial, NodeError};
/// use agentloom::state::StateSnapshot;
/// use agentloom::message::Message;
/// use async_trait::async_trait;
///
/// struct EchoNode;
///
/// #[async_trait]
/// impl Node for EchoNode {
///     async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
///         ctx.emit("echo", "replaying last user message")?;
///
///         let last = snapshot
///             .messages
///             .iter()
///             .rev()
///             .find(|m| m.has_role(Message::USER))
///             .ok_or(NodeError::MissingInput { what: "user message" })?;
///
///         Ok(NodePartial::new().with_messages(vec![Message::assistant(&last.content)]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node with the given state snapshot and context.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;
}

// ============================================================================
// Execution Context
// ============================================================================

/// Execution context handed to a node for one superstep.
///
/// Carries the node's identity, the current step number, and an emitter
/// handle for publishing events to the run's event bus.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier for this node instance (encoded `NodeKind`).
    pub node_id: String,
    /// Current execution step number.
    pub step: u64,
    /// Handle for emitting events onto the run's event bus.
    pub event_emitter: Arc<BusEmitter>,
}

impl NodeContext {
    /// Emit a node-scoped event enriched with this context's metadata.
    ///
    /// The event carries the node's id and step so it can be correlated in
    /// the run's event stream.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_emitter
            .emit(Event::node_message_with_meta(
                self.node_id.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }

    /// Emit an LLM event carrying provider output, such as assistant text
    /// produced by a completion call.
    pub fn emit_llm(
        &self,
        provider: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_emitter
            .emit(Event::llm_output(
                self.node_id.clone(),
                self.step,
                provider,
                content,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }
}

// ============================================================================
// State Updates
// ============================================================================

/// Partial state update returned by node execution.
///
/// Every field is optional so a node only touches the channels it cares
/// about. The barrier merges partials from all nodes that ran in a step; the
/// optional frontier command additionally steers which nodes run next.
///
/// # Examples
///
/// ```rust
/// use agentloom::node::NodePartial;
/// use agentloom::message::Message;
/// use agentloom::types::NodeKind;
/// use agentloom::utils::collections::new_extra_map;
/// use serde_json::json;
///
/// // Message-only response
/// let partial = NodePartial::new().with_messages(vec![Message::assistant("Done")]);
///
/// // Response with metadata
/// let mut extra = new_extra_map();
/// extra.insert("model".to_string(), json!("gpt-4o"));
/// let partial = NodePartial::new()
///     .with_messages(vec![Message::assistant("Processing complete")])
///     .with_extra(extra);
///
/// // Response that reroutes the next step back to the tools node
/// let partial = NodePartial::new()
///     .with_frontier_replace(vec![NodeKind::Custom("tools".into())]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct NodePartial {
    /// Messages to append to the transcript.
    pub messages: Option<Vec<Message>>,
    /// Key-value data to merge into the extra channel.
    pub extra: Option<FxHashMap<String, serde_json::Value>>,
    /// Errors to append to the errors channel.
    pub errors: Option<Vec<ErrorEvent>>,
    /// Routing directive for the next frontier.
    pub frontier: Option<FrontierCommand>,
}

impl NodePartial {
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Attach messages to this partial.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Attach extra data to this partial.
    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, serde_json::Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Attach error events to this partial.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Replace this node's edge-derived successors with explicit targets.
    #[must_use]
    pub fn with_frontier_replace(mut self, targets: Vec<NodeKind>) -> Self {
        self.frontier = Some(FrontierCommand::Replace(
            targets.into_iter().map(NodeRoute::from).collect(),
        ));
        self
    }

    /// Add explicit targets on top of this node's edge-derived successors.
    #[must_use]
    pub fn with_frontier_append(mut self, targets: Vec<NodeKind>) -> Self {
        self.frontier = Some(FrontierCommand::Append(
            targets.into_iter().map(NodeRoute::from).collect(),
        ));
        self
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when using `NodeContext` methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    /// Event could not be delivered because the bus is gone.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(agentloom::node::event_bus_unavailable),
        help("The event bus may be disconnected or shut down. Check the run lifecycle.")
    )]
    EventBusUnavailable,
}

/// Fatal errors raised by node execution.
///
/// These halt the run. For recoverable problems that should be tracked but
/// not abort execution, use `NodePartial.errors` instead.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(agentloom::node::missing_input),
        help("Check that an earlier node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// External provider or service error.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(agentloom::node::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(agentloom::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(agentloom::node::validation),
        help("Check input data format and required fields.")
    )]
    ValidationFailed(String),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(agentloom::node::event_bus))]
    EventBus(#[from] NodeContextError),
}
