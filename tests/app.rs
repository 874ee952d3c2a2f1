use agentloom::FrontierCommand;
use agentloom::channels::Channel;
use agentloom::channels::errors::{ErrorEvent, ErrorScope, LadderError};
use agentloom::event_bus::MemorySink;
use agentloom::graphs::GraphBuilder;
use agentloom::message::Message;
use agentloom::node::NodePartial;
use agentloom::state::VersionedState;
use agentloom::types::NodeKind;
use serde_json::json;

mod common;
use common::*;

fn linear_app(name: &'static str) -> agentloom::app::App {
    GraphBuilder::new()
        .add_node(NodeKind::Custom(name.into()), TestNode { name })
        .add_edge(NodeKind::Start, NodeKind::Custom(name.into()))
        .add_edge(NodeKind::Custom(name.into()), NodeKind::End)
        .compile()
        .unwrap()
}

#[tokio::test]
async fn barrier_bumps_only_changed_channels() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");
    let update = NodePartial::new().with_messages(vec![Message::assistant("reply")]);

    let outcome = app
        .apply_barrier(&mut state, &[NodeKind::Custom("a".into())], vec![update])
        .await
        .unwrap();

    assert_eq!(outcome.updated_channels, vec!["messages"]);
    assert_eq!(state.messages.version(), 2);
    assert_eq!(state.extra.version(), 1);
    assert_eq!(state.errors.version(), 1);
}

#[tokio::test]
async fn barrier_merges_extra_and_bumps_its_version() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");
    let mut extra = agentloom::utils::collections::new_extra_map();
    extra.insert("pending_tool_calls".to_string(), json!([]));
    let update = NodePartial::new().with_extra(extra);

    let outcome = app
        .apply_barrier(&mut state, &[NodeKind::Custom("a".into())], vec![update])
        .await
        .unwrap();

    assert!(outcome.updated_channels.contains(&"extra"));
    assert_eq!(state.extra.version(), 2);
    assert_eq!(state.snapshot().extra["pending_tool_calls"], json!([]));
}

#[tokio::test]
async fn barrier_records_errors_and_bumps_their_version() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");
    let update = NodePartial::new().with_errors(vec![ErrorEvent::node(
        "Custom:a",
        1,
        LadderError::msg("boom"),
    )]);

    let outcome = app
        .apply_barrier(&mut state, &[NodeKind::Custom("a".into())], vec![update])
        .await
        .unwrap();

    assert!(outcome.updated_channels.contains(&"errors"));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(state.errors.version(), 2);
    assert_eq!(state.errors.len(), 1);
}

#[tokio::test]
async fn barrier_orders_errors_by_scope_then_time() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");
    let updates = vec![
        NodePartial::new().with_errors(vec![
            ErrorEvent::runner("session-1", 4, LadderError::msg("runner late")),
            ErrorEvent::node("Custom:b", 2, LadderError::msg("node b")),
        ]),
        NodePartial::new().with_errors(vec![
            ErrorEvent::scheduler(3, LadderError::msg("join failed")),
            ErrorEvent::node("Custom:a", 1, LadderError::msg("node a")),
        ]),
    ];

    let outcome = app
        .apply_barrier(
            &mut state,
            &[NodeKind::Custom("a".into()), NodeKind::Custom("b".into())],
            updates,
        )
        .await
        .unwrap();

    let scopes: Vec<&ErrorScope> = outcome.errors.iter().map(|e| &e.scope).collect();
    assert!(matches!(scopes[0], ErrorScope::Node { kind, .. } if kind == "Custom:a"));
    assert!(matches!(scopes[1], ErrorScope::Node { kind, .. } if kind == "Custom:b"));
    assert!(matches!(scopes[2], ErrorScope::Scheduler { step: 3 }));
    assert!(matches!(scopes[3], ErrorScope::Runner { .. }));
}

#[tokio::test]
async fn barrier_passes_frontier_commands_through() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");
    let update = NodePartial::new()
        .with_messages(vec![Message::assistant("routing")])
        .with_frontier_replace(vec![NodeKind::Custom("tools".into())]);

    let outcome = app
        .apply_barrier(&mut state, &[NodeKind::Custom("a".into())], vec![update])
        .await
        .unwrap();

    assert_eq!(outcome.frontier_commands.len(), 1);
    let (kind, command) = &outcome.frontier_commands[0];
    assert_eq!(*kind, NodeKind::Custom("a".into()));
    assert!(matches!(command, FrontierCommand::Replace(routes)
        if routes.len() == 1 && routes[0].kind() == &NodeKind::Custom("tools".into())));
}

#[tokio::test]
async fn barrier_with_empty_updates_changes_nothing() {
    let app = linear_app("a");
    let mut state = VersionedState::new_with_user_message("hi");

    let outcome = app.apply_barrier(&mut state, &[], vec![]).await.unwrap();

    assert!(outcome.updated_channels.is_empty());
    assert_eq!(state.messages.version(), 1);
}

#[tokio::test]
async fn invoke_runs_a_linear_graph_to_completion() {
    let app = linear_app("a");
    let state = VersionedState::new_with_user_message("hello");

    let final_state = app.invoke(state).await.unwrap();

    let snapshot = final_state.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].content, "ran:a:step:1");
    assert!(snapshot.messages_version >= 2);
}

#[tokio::test]
async fn invoke_with_channel_forwards_node_events() {
    let app = GraphBuilder::new()
        .add_node(
            NodeKind::Custom("worker".into()),
            EmittingNode {
                scope: "work",
                message: "progress",
            },
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
        .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
        .compile()
        .unwrap();

    let (result, events) = app
        .invoke_with_channel(VersionedState::new_with_user_message("hi"))
        .await;
    result.unwrap();

    let scopes: Vec<String> = events
        .try_iter()
        .filter_map(|e| e.scope_label().map(str::to_string))
        .collect();
    assert!(scopes.iter().any(|s| s == "work"));
}

#[tokio::test]
async fn invoke_with_sinks_captures_events_in_memory() {
    let sink = MemorySink::new();
    let captured = sink.clone();
    let app = GraphBuilder::new()
        .add_node(
            NodeKind::Custom("worker".into()),
            EmittingNode {
                scope: "work",
                message: "captured",
            },
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
        .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
        .compile()
        .unwrap();

    app.invoke_with_sinks(
        VersionedState::new_with_user_message("hi"),
        vec![Box::new(sink)],
    )
    .await
    .unwrap();

    let entries = captured.snapshot();
    assert!(entries.iter().any(|e| e.message() == "captured"));
}
