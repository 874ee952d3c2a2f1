//! Graph compilation and structural validation.

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::types::NodeKind;

/// Errors reported when a graph fails to compile.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    /// No plain or conditional edge originates at `NodeKind::Start`, so the
    /// graph has no entry point.
    #[error("graph has no entry edges from Start")]
    #[diagnostic(
        code(agentloom::graphs::missing_start_edges),
        help("Add at least one edge or conditional edge originating at NodeKind::Start.")
    )]
    MissingStartEdges,
}

impl super::builder::GraphBuilder {
    /// Compiles the graph into an executable application.
    ///
    /// Validates that at least one edge (plain or conditional) leaves
    /// `Start`, then hands the parts to
    /// [`App::from_parts`](crate::app::App::from_parts).
    ///
    /// # Errors
    ///
    /// [`GraphCompileError::MissingStartEdges`] when the graph has no entry
    /// point.
    ///
    /// # Examples
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
    pub fn compile(self) -> Result<App, GraphCompileError> {
        let has_start_entry = self
            .edges
            .get(&NodeKind::Start)
            .map(|targets| !targets.is_empty())
            .unwrap_or(false)
            || self
                .conditional_edges
                .iter()
                .any(|edge| edge.from() == &NodeKind::Start);
        if !has_start_entry {
            return Err(GraphCompileError::MissingStartEdges);
        }

        let (nodes, edges, conditional_edges, runtime_config) = self.into_parts();
        Ok(App::from_parts(nodes, edges, conditional_edges, runtime_config))
    }
}
