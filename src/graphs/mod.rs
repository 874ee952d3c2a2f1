//! Graph definition and compilation.
//!
//! The entry point is [`GraphBuilder`], which assembles nodes, edges, and
//! conditional routing into an executable [`App`](crate::app::App). The
//! chat/tools agent graphs in [`crate::agents`] are built through this API.
//!
//! # Core Concepts
//!
//! - **Nodes**: executable units implementing [`Node`](crate::node::Node)
//! - **Edges**: static connections defining execution flow
//! - **Conditional edges**: dynamic routing from state predicates
//! - **Virtual endpoints**: `NodeKind::Start` / `NodeKind::End` exist only
//!   in the topology, never in the node registry
//!
//! # Quick Start
//!
//! ```
//! use agentloom::graphs::GraphBuilder;
//! use agentloom::types::NodeKind;
//! use agentloom::node::{Node, NodeContext, NodePartial, NodeError};
//! use agentloom::state::StateSnapshot;
//! use async_trait::async_trait;
//!
//! struct MyNode;
//!
//! #[async_trait]
//! impl Node for MyNode {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePartial, NodeError> {
//!         Ok(NodePartial::default())
//!     }
//! }
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("chat".into()), MyNode)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
//!     .add_edge(NodeKind::Custom("chat".into()), NodeKind::End)
//!     .compile()
//!     .unwrap();
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{ConditionalEdge, EdgePredicate};
