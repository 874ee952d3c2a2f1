//! Routing directives nodes can attach to their output.
//!
//! A node that wants to steer execution returns a [`FrontierCommand`] inside
//! its partial update instead of mutating state. The barrier collects these
//! commands in run order and the runner reconciles them with the graph's
//! static edges when computing the next frontier. The chat/tools loop uses
//! this to bounce between the model call and tool execution until no tool
//! calls remain.

use crate::types::NodeKind;

/// A single routing target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRoute {
    /// Route to another node in the graph.
    Node(NodeKind),
}

impl NodeRoute {
    /// Borrow the target `NodeKind`.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        match self {
            NodeRoute::Node(kind) => kind,
        }
    }

    /// Clone the target `NodeKind`.
    #[must_use]
    pub fn to_node_kind(&self) -> NodeKind {
        self.kind().clone()
    }
}

impl From<NodeKind> for NodeRoute {
    fn from(kind: NodeKind) -> Self {
        NodeRoute::Node(kind)
    }
}

/// How a node's routes combine with the frontier the edges would produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrontierCommand {
    /// Add these routes on top of the node's edge-derived successors.
    Append(Vec<NodeRoute>),
    /// Discard the edge-derived successors and use these routes instead.
    Replace(Vec<NodeRoute>),
}
