//! `GraphBuilder` and its fluent API for assembling agent graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, EdgePredicate};
use crate::node::Node;
use crate::runtimes::RuntimeConfig;
use crate::types::NodeKind;

/// Builder for agent graphs.
///
/// Add nodes, wire them with plain or conditional edges, then
/// [`compile`](Self::compile) into an executable [`App`](crate::app::App).
///
/// `NodeKind::Start` and `NodeKind::End` are virtual endpoints: they anchor
/// edges but are never registered or executed.
///
/// # Examples
///
/// A linear one-node graph:
///
/// ```
/// use agentloom::graphs::GraphBuilder;
/// use agentloom::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl agentloom::node::Node for MyNode {
/// #     async fn run(&self, _: agentloom::state::StateSnapshot, _: agentloom::node::NodeContext) -> Result<agentloom::node::NodePartial, agentloom::node::NodeError> {
/// #         Ok(agentloom::node::NodePartial::default())
/// #     }
/// # }
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("chat".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
///     .add_edge(NodeKind::Custom("chat".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
///
/// A chat/tools loop where the predicate decides whether to call tools or
/// finish:
///
/// ```
/// use agentloom::graphs::{GraphBuilder, EdgePredicate};
/// use agentloom::types::NodeKind;
/// use std::sync::Arc;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl agentloom::node::Node for MyNode {
/// #     async fn run(&self, _: agentloom::state::StateSnapshot, _: agentloom::node::NodeContext) -> Result<agentloom::node::NodePartial, agentloom::node::NodeError> {
/// #         Ok(agentloom::node::NodePartial::default())
/// #     }
/// # }
/// let route: EdgePredicate = Arc::new(|snapshot| {
///     if snapshot.extra.contains_key("pending_tool_calls") {
///         vec![NodeKind::Custom("tools".into()).as_target()]
///     } else {
///         vec![NodeKind::end_target()]
///     }
/// });
///
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("chat".into()), MyNode)
///     .add_node(NodeKind::Custom("tools".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
///     .add_conditional_edge(NodeKind::Custom("chat".into()), route)
///     .add_edge(NodeKind::Custom("tools".into()), NodeKind::Custom("chat".into()))
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    /// Registry of all nodes in the graph, keyed by their identifier.
    pub nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    /// Unconditional edges defining static graph topology.
    pub edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    /// Conditional edges for dynamic routing based on state.
    pub conditional_edges: Vec<ConditionalEdge>,
    /// Runtime configuration for the compiled application.
    pub runtime_config: RuntimeConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Adds a conditional edge to the graph.
    ///
    /// When execution reaches `from`, the predicate is evaluated with the
    /// current snapshot and returns encoded target names. Targets that do
    /// not exist in the graph are dropped at runtime with a warning;
    /// `NodeKind::end_target()` is always valid.
    #[must_use]
    pub fn add_conditional_edge(mut self, from: NodeKind, predicate: EdgePredicate) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, predicate));
        self
    }

    /// Adds a node to the graph.
    ///
    /// `NodeKind::Start` and `NodeKind::End` are virtual structural
    /// endpoints. Passing either here is ignored with a warning; they are
    /// never stored or executed, while edges from `Start` and to `End`
    /// remain valid topology.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(
                    ?id,
                    "Ignoring registration of virtual node kind (Start/End are virtual)"
                );
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds an unconditional edge between two nodes.
    ///
    /// Multiple edges from the same node fan out; multiple edges to the
    /// same node fan in. Duplicate edges are kept as given.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Configures runtime settings for the compiled application, such as
    /// the session id used by [`App::invoke`](crate::app::App::invoke) and
    /// the event bus sinks.
    ///
    /// ```
    /// use agentloom::graphs::GraphBuilder;
    /// use agentloom::runtimes::RuntimeConfig;
    ///
    /// let builder = GraphBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::with_stdout_event_bus(Some("sess-1".into())));
    /// ```
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }

    /// Decompose the builder into the pieces
    /// [`App::from_parts`](crate::app::App::from_parts) consumes.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        FxHashMap<NodeKind, Arc<dyn Node>>,
        FxHashMap<NodeKind, Vec<NodeKind>>,
        Vec<ConditionalEdge>,
        RuntimeConfig,
    ) {
        (
            self.nodes,
            self.edges,
            self.conditional_edges,
            self.runtime_config,
        )
    }
}
