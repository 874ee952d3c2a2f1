use std::sync::Arc;

use agentloom::graphs::{EdgePredicate, GraphBuilder, GraphCompileError};
use agentloom::state::StateSnapshot;
use agentloom::types::NodeKind;

mod common;
use common::*;

#[test]
fn compile_requires_a_start_edge() {
    let err = GraphBuilder::new()
        .add_node(NodeKind::Custom("a".into()), NoopNode)
        .add_edge(NodeKind::Custom("a".into()), NodeKind::End)
        .compile()
        .unwrap_err();

    assert!(matches!(err, GraphCompileError::MissingStartEdges));
}

#[test]
fn compile_collects_nodes_and_edges() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("a".into()), TestNode { name: "a" })
        .add_node(NodeKind::Custom("b".into()), TestNode { name: "b" })
        .add_edge(NodeKind::Start, NodeKind::Custom("a".into()))
        .add_edge(NodeKind::Custom("a".into()), NodeKind::Custom("b".into()))
        .add_edge(NodeKind::Custom("b".into()), NodeKind::End)
        .compile()
        .unwrap();

    assert_eq!(app.nodes().len(), 2);
    assert_eq!(app.edges().len(), 3);
    assert!(app.conditional_edges().is_empty());
}

#[test]
fn conditional_edges_ride_along_compilation() {
    let predicate: EdgePredicate = Arc::new(|snapshot: StateSnapshot| {
        if snapshot.extra.contains_key("route_left") {
            vec!["left".to_string()]
        } else {
            vec!["right".to_string()]
        }
    });

    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("root".into()), TestNode { name: "root" })
        .add_node(NodeKind::Custom("left".into()), TestNode { name: "left" })
        .add_node(NodeKind::Custom("right".into()), TestNode { name: "right" })
        .add_edge(NodeKind::Start, NodeKind::Custom("root".into()))
        .add_conditional_edge(NodeKind::Custom("root".into()), predicate)
        .compile()
        .unwrap();

    assert_eq!(app.conditional_edges().len(), 1);
    assert_eq!(
        *app.conditional_edges()[0].from(),
        NodeKind::Custom("root".into())
    );
}

#[test]
fn duplicate_node_registration_keeps_the_last() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("a".into()), TestNode { name: "first" })
        .add_node(NodeKind::Custom("a".into()), TestNode { name: "second" })
        .add_edge(NodeKind::Start, NodeKind::Custom("a".into()))
        .compile()
        .unwrap();

    assert_eq!(app.nodes().len(), 1);
}
