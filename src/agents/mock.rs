//! Offline chat node answering from canned responses.

use async_trait::async_trait;
use rand::seq::IndexedRandom;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;

/// Canned assistant replies, one picked at random per turn.
pub const MOCK_RESPONSES: [&str; 5] = [
    "こんにちは！何かお手伝いできることはありますか？",
    "了解しました。他に質問はありますか？",
    "それは興味深いですね。もう少し詳しく教えていただけますか？",
    "お役に立てて嬉しいです！",
    "なるほど、理解しました。",
];

/// Chat node that never calls a provider.
///
/// Replies with a random entry from [`MOCK_RESPONSES`], which keeps the
/// full graph loop exercisable in development and tests without an API
/// key or network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockChatNode;

#[async_trait]
impl Node for MockChatNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let reply = MOCK_RESPONSES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(MOCK_RESPONSES[0]);

        ctx.emit_llm("mock", reply)?;
        Ok(NodePartial::new().with_messages(vec![Message::assistant(reply)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use crate::state::VersionedState;

    #[tokio::test]
    async fn replies_with_a_canned_response() {
        let bus = EventBus::default();
        let ctx = NodeContext {
            node_id: "chat".to_string(),
            step: 1,
            event_emitter: bus.get_emitter(),
        };
        let snapshot = VersionedState::new_with_user_message("こんにちは").snapshot();

        let partial = MockChatNode.run(snapshot, ctx).await.unwrap();

        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].has_role(Message::ASSISTANT));
        assert!(MOCK_RESPONSES.contains(&messages[0].content.as_str()));
    }
}
