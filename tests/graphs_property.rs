#[macro_use]
extern crate proptest;

use proptest::prelude::{Strategy, prop};

// Generators shared by the routing properties below

/// Generate valid custom node names.
///
/// Constraints:
/// - Starts with a letter
/// - Followed by 0..16 of [A-Za-z0-9_]
/// - Excludes the endpoint names and the fixed entry node
fn node_name_strategy() -> impl Strategy<Value = String> {
    let base = prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,16}").unwrap();
    base.prop_filter("exclude reserved names", |s| {
        s != "Start" && s != "End" && s != "entry"
    })
}

// Sanity checks on the generator and the identifier encoding
proptest! {
    #[test]
    fn prop_node_name_non_empty(name in node_name_strategy()) {
        prop_assert!(!name.is_empty());
        prop_assert!(name.chars().next().unwrap().is_ascii_alphabetic());
    }

    #[test]
    fn prop_nodekind_encoding_round_trips(name in node_name_strategy()) {
        let kind = agentloom::types::NodeKind::Custom(name);
        prop_assert_eq!(agentloom::types::NodeKind::decode(&kind.encode()), kind);
    }
}

mod common;
use common::*;

use proptest::prelude::any;
use rustc_hash::FxHashSet;
use std::sync::Arc;

use agentloom::graphs::{EdgePredicate, GraphBuilder};
use agentloom::runtimes::{AppRunner, SessionInit, StepOptions, StepResult};
use agentloom::state::StateSnapshot;
use agentloom::types::NodeKind;

fn block_on<F: std::future::Future<Output = ()>>(fut: F) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(fut);
}

/// Start -> entry -> End, with `pool` registered as extra routable nodes.
fn routing_graph(pool: &[String]) -> GraphBuilder {
    let mut gb = GraphBuilder::new()
        .add_node(NodeKind::Custom("entry".into()), TestNode { name: "entry" })
        .add_edge(NodeKind::Start, NodeKind::Custom("entry".into()))
        .add_edge(NodeKind::Custom("entry".into()), NodeKind::End);
    for n in pool {
        gb = gb.add_node(NodeKind::Custom(n.clone()), TestNode { name: "t" });
    }
    gb
}

async fn first_step(app: agentloom::app::App, session: &str) -> agentloom::runtimes::StepReport {
    let mut runner = AppRunner::new(app);
    match runner
        .create_session(session.to_string(), state_with_user("seed"))
        .await
        .unwrap()
    {
        SessionInit::Fresh => {}
        _ => panic!("expected fresh session"),
    }
    match runner.run_step(session, StepOptions::default()).await.unwrap() {
        StepResult::Completed(rep) => rep,
        _ => panic!("expected completed step"),
    }
}

proptest! {
    #[test]
    fn prop_registered_predicate_targets_all_route(
        mut names in prop::collection::vec(node_name_strategy(), 1..8),
        include_end in any::<bool>(),
    ) {
        // Dedup to avoid duplicate node registrations
        names.sort();
        names.dedup();

        block_on(async move {
            let mut targets: Vec<String> = names.clone();
            if include_end { targets.push("End".into()); }
            let predicate: EdgePredicate = Arc::new(move |_snap| targets.clone());
            let app = routing_graph(&names)
                .add_conditional_edge(NodeKind::Custom("entry".into()), predicate)
                .compile()
                .unwrap();

            let rep = first_step(app, "sess_valid").await;
            let frontier: FxHashSet<_> = rep.next_frontier.into_iter().collect();

            let allowed: FxHashSet<_> = names.clone().into_iter().collect();
            for n in names {
                assert!(frontier.contains(&NodeKind::Custom(n)));
            }
            // Unknown custom targets never survive into the frontier
            for k in frontier {
                if let NodeKind::Custom(s) = k { assert!(allowed.contains(&s)); }
            }
        });
    }

    #[test]
    fn prop_unregistered_targets_are_dropped(
        mut valid in prop::collection::vec(node_name_strategy(), 1..6),
        mut invalid in prop::collection::vec(node_name_strategy(), 1..6),
    ) {
        valid.sort(); valid.dedup();
        invalid.sort(); invalid.dedup();
        invalid.retain(|n| !valid.contains(n));
        prop_assume!(!valid.is_empty());
        prop_assume!(!invalid.is_empty());

        block_on(async move {
            let mut targets = valid.clone();
            targets.extend(invalid.clone());
            targets.push("End".into());
            let predicate: EdgePredicate = Arc::new(move |_snap| targets.clone());
            let app = routing_graph(&valid)
                .add_conditional_edge(NodeKind::Custom("entry".into()), predicate)
                .compile()
                .unwrap();

            let rep = first_step(app, "sess_mix").await;
            let frontier: FxHashSet<_> = rep.next_frontier.into_iter().collect();

            for n in &valid { assert!(frontier.contains(&NodeKind::Custom(n.clone()))); }
            assert!(frontier.contains(&NodeKind::End));
            for n in &invalid { assert!(!frontier.contains(&NodeKind::Custom(n.clone()))); }
        });
    }

    #[test]
    fn prop_fan_out_is_deduplicated(
        mut pool in prop::collection::vec(node_name_strategy(), 2..16),
        fanout in 1usize..64,
    ) {
        pool.sort();
        pool.dedup();

        block_on(async move {
            // Predicate output with heavy duplication
            let mut outs: Vec<String> = Vec::new();
            for i in 0..fanout { outs.push(pool[i % pool.len()].clone()); }
            if fanout % 2 == 0 { outs.push("End".into()); }
            let predicate: EdgePredicate = Arc::new(move |_snap| outs.clone());
            let app = routing_graph(&pool)
                .add_conditional_edge(NodeKind::Custom("entry".into()), predicate)
                .compile()
                .unwrap();

            let rep = first_step(app, "sess_fan").await;

            let mut counts = std::collections::HashMap::<String, usize>::new();
            for k in rep.next_frontier {
                if let NodeKind::Custom(s) = k { *counts.entry(s).or_insert(0) += 1; }
            }
            for n in pool { assert!(counts.get(&n).cloned().unwrap_or(0) <= 1); }
        });
    }

    #[test]
    fn prop_empty_predicate_result_is_safe(
        mut registered in prop::collection::vec(node_name_strategy(), 1..5),
    ) {
        registered.sort();
        registered.dedup();

        block_on(async move {
            let predicate: EdgePredicate = Arc::new(|_snap| Vec::new());
            let app = routing_graph(&registered)
                .add_conditional_edge(NodeKind::Custom("entry".into()), predicate)
                .compile()
                .unwrap();

            let rep = first_step(app, "sess_empty").await;
            let frontier: FxHashSet<_> = rep.next_frontier.into_iter().collect();

            // Only the static edge fires
            assert!(frontier.contains(&NodeKind::End));
            for n in &registered {
                assert!(!frontier.contains(&NodeKind::Custom(n.clone())));
            }
        });
    }

    #[test]
    fn prop_threshold_routing_on_extra_data(
        key in prop::string::string_regex("[a-z][a-z0-9_]{0,8}").unwrap(),
        threshold in 0i64..100,
        value in 0i64..100,
    ) {
        block_on(async move {
            let key_clone = key.clone();
            let predicate: EdgePredicate = Arc::new(move |snap: StateSnapshot| {
                let above = snap
                    .extra
                    .get(&key_clone)
                    .and_then(serde_json::Value::as_i64)
                    .is_some_and(|n| n >= threshold);
                if above {
                    vec!["high_road".to_string()]
                } else {
                    vec!["low_road".to_string()]
                }
            });

            let pool = vec!["high_road".to_string(), "low_road".to_string()];
            let app = routing_graph(&pool)
                .add_edge(NodeKind::Custom("high_road".into()), NodeKind::End)
                .add_edge(NodeKind::Custom("low_road".into()), NodeKind::End)
                .add_conditional_edge(NodeKind::Custom("entry".into()), predicate)
                .compile()
                .unwrap();

            let mut runner = AppRunner::new(app);
            let mut state = state_with_user("seed");
            state.extra.get_mut().insert(key.clone(), serde_json::json!(value));
            runner.create_session("sess_cond".into(), state).await.unwrap();
            let rep = match runner.run_step("sess_cond", StepOptions::default()).await.unwrap() {
                StepResult::Completed(rep) => rep,
                _ => panic!("expected completed step"),
            };

            let frontier: FxHashSet<_> = rep.next_frontier.into_iter().collect();
            let expected = if value >= threshold { "high_road" } else { "low_road" };
            let skipped = if value >= threshold { "low_road" } else { "high_road" };
            assert!(
                frontier.contains(&NodeKind::Custom(expected.into())),
                "expected {expected} for value {value} against threshold {threshold}",
            );
            assert!(!frontier.contains(&NodeKind::Custom(skipped.into())));
        });
    }
}
