//! Superstep execution with version gating.
//!
//! A superstep takes the current frontier, filters out nodes whose observed
//! channel versions are unchanged, and runs the remainder concurrently up to
//! a configurable limit. Outputs are returned in frontier order so the
//! barrier merge stays deterministic regardless of which task finished
//! first.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::event_bus::BusEmitter;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Runs frontiers of nodes with bounded concurrency.
#[derive(Clone, Debug)]
pub struct Scheduler {
    pub concurrency_limit: usize,
}

impl Scheduler {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Whether a node still needs to run against the given snapshot.
    ///
    /// A node runs if it has never been scheduled, or if any channel version
    /// increased since the last snapshot it saw.
    pub fn should_run(&self, state: &SchedulerState, id: &str, snapshot: &StateSnapshot) -> bool {
        match state.versions_seen.get(id) {
            None => true,
            Some(seen) => {
                let newer = |channel: &str, current: u32| {
                    seen.get(channel).map(|&v| current > v).unwrap_or(true)
                };
                newer("messages", snapshot.messages_version)
                    || newer("extra", snapshot.extra_version)
                    || newer("errors", snapshot.errors_version)
            }
        }
    }

    /// Record the channel versions a node observed when it was scheduled.
    pub fn record_seen(&self, state: &mut SchedulerState, id: &str, snapshot: &StateSnapshot) {
        let seen = state.versions_seen.entry(id.to_string()).or_default();
        seen.insert("messages".to_string(), snapshot.messages_version);
        seen.insert("extra".to_string(), snapshot.extra_version);
        seen.insert("errors".to_string(), snapshot.errors_version);
    }

    /// Execute one superstep over `frontier` against `snapshot`.
    ///
    /// Virtual nodes and nodes with unchanged versions are reported in
    /// `skipped_nodes`. The first node failure aborts the remaining tasks
    /// and surfaces as [`SchedulerError::NodeRun`].
    pub async fn superstep(
        &self,
        state: &mut SchedulerState,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: Vec<NodeKind>,
        snapshot: StateSnapshot,
        step: u64,
        emitter: Arc<BusEmitter>,
    ) -> Result<StepRunResult, SchedulerError> {
        let mut ran_nodes = Vec::new();
        let mut skipped_nodes = Vec::new();
        let mut to_run: Vec<(usize, NodeKind, Arc<dyn Node>)> = Vec::new();

        for kind in frontier {
            if matches!(kind, NodeKind::Start | NodeKind::End) {
                skipped_nodes.push(kind);
                continue;
            }
            let Some(node) = nodes.get(&kind) else {
                debug!(node = %kind, step, "frontier node not registered, skipping");
                skipped_nodes.push(kind);
                continue;
            };
            let id = kind.encode();
            if !self.should_run(state, &id, &snapshot) {
                debug!(node = %kind, step, "channel versions unchanged, skipping");
                skipped_nodes.push(kind);
                continue;
            }
            self.record_seen(state, &id, &snapshot);
            to_run.push((ran_nodes.len(), kind.clone(), Arc::clone(node)));
            ran_nodes.push(kind);
        }

        let mut outputs: Vec<Option<(NodeKind, NodePartial)>> =
            (0..to_run.len()).map(|_| None).collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut join_set = JoinSet::new();
        for (idx, kind, node) in to_run {
            let semaphore = Arc::clone(&semaphore);
            let snapshot = snapshot.clone();
            let ctx = NodeContext {
                node_id: kind.encode(),
                step,
                event_emitter: Arc::clone(&emitter),
            };
            join_set.spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // while the runtime tears down; run unthrottled then.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = node.run(snapshot, ctx).await;
                (idx, kind, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (idx, kind, result) = joined.map_err(SchedulerError::Join)?;
            match result {
                Ok(partial) => outputs[idx] = Some((kind, partial)),
                Err(source) => return Err(SchedulerError::NodeRun { kind, step, source }),
            }
        }

        Ok(StepRunResult {
            ran_nodes,
            skipped_nodes,
            outputs: outputs.into_iter().flatten().collect(),
        })
    }
}

/// Per-session scheduling memory: which channel versions each node has
/// already seen, keyed by encoded node id.
#[derive(Clone, Debug, Default)]
pub struct SchedulerState {
    pub versions_seen: FxHashMap<String, FxHashMap<String, u32>>,
}

/// Outcome of one superstep.
///
/// `ran_nodes` and `outputs` preserve frontier order; `outputs` holds the
/// partial each ran node produced.
#[derive(Debug, Default)]
pub struct StepRunResult {
    pub ran_nodes: Vec<NodeKind>,
    pub skipped_nodes: Vec<NodeKind>,
    pub outputs: Vec<(NodeKind, NodePartial)>,
}

/// Errors raised while executing a superstep.
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    /// A node returned a fatal error.
    #[error("node {kind} failed at step {step}: {source}")]
    #[diagnostic(code(agentloom::scheduler::node_run))]
    NodeRun {
        kind: NodeKind,
        step: u64,
        #[source]
        source: NodeError,
    },

    /// A node task panicked or was cancelled.
    #[error("node task join error: {0}")]
    #[diagnostic(code(agentloom::scheduler::join))]
    Join(#[from] tokio::task::JoinError),
}
