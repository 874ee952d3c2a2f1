//! Snapshot and state fixtures shared across integration tests.

use agentloom::event_bus::EventBus;
use agentloom::node::NodeContext;
use agentloom::state::{StateSnapshot, VersionedState};

pub fn empty_snapshot() -> StateSnapshot {
    VersionedState::builder().build().snapshot()
}

pub fn state_with_user(content: &str) -> VersionedState {
    VersionedState::new_with_user_message(content)
}

/// Snapshot with specific channel versions, for scheduler gating tests.
pub fn snapshot_with_versions(messages_version: u32, extra_version: u32) -> StateSnapshot {
    let mut snapshot = empty_snapshot();
    snapshot.messages_version = messages_version;
    snapshot.extra_version = extra_version;
    snapshot
}

/// Node context wired to the given bus, for driving nodes directly.
pub fn node_ctx(bus: &EventBus, node_id: &str, step: u64) -> NodeContext {
    NodeContext {
        node_id: node_id.to_string(),
        step,
        event_emitter: bus.get_emitter(),
    }
}
