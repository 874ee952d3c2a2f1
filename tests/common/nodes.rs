//! Shared node implementations for integration tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{Duration, sleep};

use agentloom::message::Message;
use agentloom::node::{Node, NodeContext, NodeError, NodePartial};
use agentloom::state::StateSnapshot;
use agentloom::utils::collections::new_extra_map;

/// Appends one fixed assistant message.
#[derive(Debug, Clone)]
pub struct SimpleMessageNode {
    pub msg: &'static str,
}

impl SimpleMessageNode {
    pub fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[async_trait]
impl Node for SimpleMessageNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_messages(vec![Message::assistant(self.msg)]))
    }
}

/// Produces an empty partial.
#[derive(Debug, Clone)]
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::default())
    }
}

/// Records which node ran at which step in the transcript.
#[derive(Debug, Clone)]
pub struct TestNode {
    pub name: &'static str,
}

#[async_trait]
impl Node for TestNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(
            NodePartial::new().with_messages(vec![Message::assistant(format!(
                "ran:{}:step:{}",
                self.name, ctx.step
            ))]),
        )
    }
}

/// Like [`TestNode`] but sleeps first, for concurrency assertions.
#[derive(Debug, Clone)]
pub struct DelayedNode {
    pub name: &'static str,
    pub delay_ms: u64,
}

#[async_trait]
impl Node for DelayedNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        sleep(Duration::from_millis(self.delay_ms)).await;
        Ok(
            NodePartial::new().with_messages(vec![Message::assistant(format!(
                "ran:{}:step:{}",
                self.name, ctx.step
            ))]),
        )
    }
}

/// Always fails with a missing-input error.
#[derive(Debug, Clone)]
pub struct FailingNode {
    pub what: &'static str,
}

impl Default for FailingNode {
    fn default() -> Self {
        Self { what: "test_key" }
    }
}

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::MissingInput { what: self.what })
    }
}

/// Emits one scoped event, then appends an assistant message.
#[derive(Debug, Clone)]
pub struct EmittingNode {
    pub scope: &'static str,
    pub message: &'static str,
}

#[async_trait]
impl Node for EmittingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        ctx.emit(self.scope, self.message)?;
        Ok(NodePartial::new().with_messages(vec![Message::assistant(self.message)]))
    }
}

/// Writes one key into the extra channel.
#[derive(Debug, Clone)]
pub struct SetExtraNode {
    pub key: &'static str,
    pub value: Value,
}

#[async_trait]
impl Node for SetExtraNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let mut extra = new_extra_map();
        extra.insert(self.key.to_string(), self.value.clone());
        Ok(NodePartial::new().with_extra(extra))
    }
}
