use std::sync::Arc;
use std::time::Duration;

use agentloom::channels::Channel;
use agentloom::channels::errors::ErrorScope;
use agentloom::event_bus::{EventBus, STREAM_END_SCOPE};
use agentloom::graphs::{EdgePredicate, GraphBuilder};
use agentloom::runtimes::{AppRunner, PausedReason, RunnerError, SessionInit, StepOptions, StepResult};
use agentloom::schedulers::SchedulerError;
use agentloom::state::StateSnapshot;
use agentloom::types::NodeKind;
use serde_json::json;

mod common;
use common::*;

fn linear_app() -> agentloom::app::App {
    GraphBuilder::new()
        .add_node(NodeKind::Custom("a".into()), TestNode { name: "a" })
        .add_node(NodeKind::Custom("b".into()), TestNode { name: "b" })
        .add_edge(NodeKind::Start, NodeKind::Custom("a".into()))
        .add_edge(NodeKind::Custom("a".into()), NodeKind::Custom("b".into()))
        .add_edge(NodeKind::Custom("b".into()), NodeKind::End)
        .compile()
        .unwrap()
}

#[tokio::test]
async fn create_session_is_fresh_then_resumed() {
    let mut runner = AppRunner::new(linear_app());

    let first = runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();
    assert_eq!(first, SessionInit::Fresh);

    // Same id again: the stored session wins and reports its progress.
    let second = runner
        .create_session("s1".to_string(), state_with_user("ignored"))
        .await
        .unwrap();
    assert_eq!(second, SessionInit::Resumed { checkpoint_step: 0 });

    assert_eq!(runner.list_sessions().len(), 1);
}

#[tokio::test]
async fn run_step_reports_progress_and_versions() {
    let mut runner = AppRunner::new(linear_app());
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let result = runner
        .run_step("s1", StepOptions::default())
        .await
        .unwrap();

    match result {
        StepResult::Completed(report) => {
            assert_eq!(report.step, 1);
            assert_eq!(report.ran_nodes, vec![NodeKind::Custom("a".into())]);
            assert_eq!(report.next_frontier, vec![NodeKind::Custom("b".into())]);
            assert!(report.barrier_outcome.updated_channels.contains(&"messages"));
            assert_eq!(report.state_versions.messages_version, 2);
            assert!(!report.completed);
        }
        other => panic!("expected Completed, got: {other:?}"),
    }
}

#[tokio::test]
async fn run_until_complete_walks_the_whole_graph() {
    let mut runner = AppRunner::new(linear_app());
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let final_state = runner.run_until_complete("s1").await.unwrap();

    let snapshot = final_state.snapshot();
    let contents: Vec<&str> = snapshot
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, ["hi", "ran:a:step:1", "ran:b:step:2"]);
}

#[tokio::test]
async fn unknown_session_is_an_error() {
    let mut runner = AppRunner::new(linear_app());
    let err = runner.run_until_complete("missing").await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::SessionNotFound { ref session_id } if session_id == "missing"
    ));
}

#[tokio::test]
async fn interrupt_before_pauses_without_running_the_node() {
    let mut runner = AppRunner::new(linear_app());
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let options = StepOptions {
        interrupt_before: vec![NodeKind::Custom("a".into())],
        ..StepOptions::default()
    };
    let result = runner.run_step("s1", options).await.unwrap();

    match result {
        StepResult::Paused(paused) => {
            assert!(matches!(
                paused.reason,
                PausedReason::BeforeNode(NodeKind::Custom(ref name)) if name == "a"
            ));
            // Nothing ran, so the transcript still has only the user turn.
            assert_eq!(paused.session_state.state.messages.len(), 1);
        }
        other => panic!("expected Paused, got: {other:?}"),
    }
}

#[tokio::test]
async fn interrupt_after_pauses_with_the_node_applied() {
    let mut runner = AppRunner::new(linear_app());
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let options = StepOptions {
        interrupt_after: vec![NodeKind::Custom("a".into())],
        ..StepOptions::default()
    };
    let result = runner.run_step("s1", options).await.unwrap();

    match result {
        StepResult::Paused(paused) => {
            assert!(matches!(
                paused.reason,
                PausedReason::AfterNode(NodeKind::Custom(ref name)) if name == "a"
            ));
            assert_eq!(paused.session_state.state.messages.len(), 2);
        }
        other => panic!("expected Paused, got: {other:?}"),
    }
}

#[tokio::test]
async fn interrupt_each_step_pauses_between_supersteps() {
    let mut runner = AppRunner::new(linear_app());
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let options = StepOptions {
        interrupt_each_step: true,
        ..StepOptions::default()
    };
    let result = runner.run_step("s1", options).await.unwrap();

    match result {
        StepResult::Paused(paused) => {
            assert!(matches!(paused.reason, PausedReason::AfterStep(1)));
        }
        other => panic!("expected Paused, got: {other:?}"),
    }

    // A later unrestricted run still finishes the graph.
    let final_state = runner.run_until_complete("s1").await.unwrap();
    assert_eq!(final_state.messages.len(), 3);
}

#[tokio::test]
async fn conditional_routing_detours_through_tools_then_ends() {
    // First chat pass routes to tools (no "handled" flag yet), tools sets
    // the flag and hands control back, second chat pass routes to End.
    let predicate: EdgePredicate = Arc::new(|snapshot: StateSnapshot| {
        if snapshot.extra.contains_key("handled") {
            vec![NodeKind::end_target()]
        } else {
            vec!["tools".to_string()]
        }
    });

    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("chat".into()), TestNode { name: "chat" })
        .add_node(
            NodeKind::Custom("tools".into()),
            SetExtraNode {
                key: "handled",
                value: json!(true),
            },
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
        .add_edge(NodeKind::Custom("tools".into()), NodeKind::Custom("chat".into()))
        .add_conditional_edge(NodeKind::Custom("chat".into()), predicate)
        .compile()
        .unwrap();

    let mut runner = AppRunner::new(app);
    runner
        .create_session("loop".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let final_state = runner.run_until_complete("loop").await.unwrap();
    let snapshot = final_state.snapshot();

    let contents: Vec<&str> = snapshot.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hi", "ran:chat:step:1", "ran:chat:step:3"]);
    assert_eq!(snapshot.extra.get("handled"), Some(&json!(true)));
}

#[tokio::test]
async fn node_failure_is_recorded_then_rethrown() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("boom".into()), FailingNode::default())
        .add_edge(NodeKind::Start, NodeKind::Custom("boom".into()))
        .add_edge(NodeKind::Custom("boom".into()), NodeKind::End)
        .compile()
        .unwrap();

    let mut runner = AppRunner::new(app);
    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();

    let err = runner.run_until_complete("s1").await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Scheduler(SchedulerError::NodeRun { ref kind, step: 1, .. })
            if kind.encode() == "Custom:boom"
    ));

    // The failure is also persisted on the session's errors channel.
    let session = runner.get_session("s1").expect("session survives the error");
    let snapshot = session.state.snapshot();
    assert_eq!(snapshot.errors.len(), 1);
    assert!(matches!(
        snapshot.errors[0].scope,
        ErrorScope::Node { ref kind, step: 1 } if kind == "Custom:boom"
    ));
    assert!(snapshot.errors_version >= 2);
}

#[tokio::test]
async fn taken_event_stream_sees_the_end_marker() {
    let app = linear_app();
    let bus = EventBus::default();
    let mut runner = AppRunner::with_bus(app, bus);
    let mut stream = runner.event_stream().expect("first take succeeds");
    assert!(runner.event_stream().is_none());

    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();
    runner.run_until_complete("s1").await.unwrap();

    let mut saw_end = false;
    while let Some(event) = stream.next_timeout(Duration::from_millis(500)).await {
        if event.scope_label() == Some(STREAM_END_SCOPE) {
            saw_end = true;
            break;
        }
    }
    assert!(saw_end, "stream should deliver the end-of-run marker");
}

#[tokio::test]
async fn failed_run_still_ends_the_stream_exactly_once() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("boom".into()), FailingNode::default())
        .add_edge(NodeKind::Start, NodeKind::Custom("boom".into()))
        .add_edge(NodeKind::Custom("boom".into()), NodeKind::End)
        .compile()
        .unwrap();

    let mut runner = AppRunner::with_bus(app, EventBus::default());
    let mut stream = runner.event_stream().expect("first take succeeds");

    runner
        .create_session("s1".to_string(), state_with_user("hi"))
        .await
        .unwrap();
    runner.run_until_complete("s1").await.unwrap_err();

    // The stream is closed after finalization, so this drains to the end.
    let mut end_markers = 0;
    while let Some(event) = stream.next_timeout(Duration::from_millis(500)).await {
        if event.scope_label() == Some(STREAM_END_SCOPE) {
            end_markers += 1;
        }
    }
    assert_eq!(end_markers, 1);
}
