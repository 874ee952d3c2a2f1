//! Edge types and routing predicates for conditional graph flow.

use crate::types::NodeKind;
use std::sync::Arc;

/// Predicate function for conditional edge routing.
///
/// Takes a [`StateSnapshot`](crate::state::StateSnapshot) and returns encoded
/// target names deciding which nodes run next. Used with
/// [`GraphBuilder::add_conditional_edge`](crate::graphs::GraphBuilder::add_conditional_edge).
///
/// # Examples
///
/// ```
/// use agentloom::graphs::EdgePredicate;
/// use agentloom::types::NodeKind;
/// use std::sync::Arc;
///
/// // Loop back into the tools node while tool calls are pending, otherwise
/// // finish the run.
/// let route_tools: EdgePredicate = Arc::new(|snapshot| {
///     let pending = snapshot
///         .extra
///         .get("pending_tool_calls")
///         .and_then(|v| v.as_array())
///         .map(|calls| !calls.is_empty())
///         .unwrap_or(false);
///     if pending {
///         vec![NodeKind::Custom("tools".into()).as_target()]
///     } else {
///         vec![NodeKind::end_target()]
///     }
/// });
/// ```
pub type EdgePredicate =
    Arc<dyn Fn(crate::state::StateSnapshot) -> Vec<String> + Send + Sync + 'static>;

/// A conditional edge that routes based on a predicate function.
///
/// Fields stay private so edges are always constructed through
/// [`ConditionalEdge::new`], which keeps the builder API uniform.
///
/// ```
/// use agentloom::graphs::{ConditionalEdge, EdgePredicate};
/// use agentloom::types::NodeKind;
/// use std::sync::Arc;
///
/// let predicate: EdgePredicate = Arc::new(|_snapshot| vec![NodeKind::end_target()]);
/// let edge = ConditionalEdge::new(NodeKind::Custom("chat".into()), predicate);
/// assert_eq!(edge.from(), &NodeKind::Custom("chat".into()));
/// ```
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    predicate: EdgePredicate,
}

impl ConditionalEdge {
    /// Creates a new conditional edge from a source node and predicate.
    pub fn new(from: impl Into<NodeKind>, predicate: EdgePredicate) -> Self {
        Self {
            from: from.into(),
            predicate,
        }
    }

    /// Source node of this conditional edge.
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// Routing predicate of this conditional edge.
    pub fn predicate(&self) -> &EdgePredicate {
        &self.predicate
    }
}
