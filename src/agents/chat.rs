//! LLM-backed chat node.
//!
//! Calls the hosted completion provider with the run transcript, a persona
//! preamble enriched with the caller's profile, and whatever tools are in
//! scope. A plain reply lands on the messages channel and is emitted as an
//! LLM event; tool-call requests are parked in run state for the tool
//! executor node to pick up.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel};
use rig::providers::openai;

use crate::agents::tools::{
    PENDING_TOOL_CALLS_KEY, ToolCall, builtin_tool_definitions, frontend_tool_definitions,
};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;

/// Persona used when a graph does not override it.
pub const DEFAULT_PERSONA: &str = "You are a helpful assistant.";

/// Extra-channel key carrying the caller's profile, injected by the server
/// after authentication.
pub const USER_PROFILE_KEY: &str = "user_profile";

/// Chat node backed by a hosted completion model.
///
/// The client is constructed per call; provider handles are cheap and this
/// keeps the node state to plain strings.
#[derive(Debug, Clone)]
pub struct ChatNode {
    api_key: String,
    model: String,
    persona: String,
}

impl ChatNode {
    /// Chat node with the default persona and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_persona(api_key, DEFAULT_PERSONA)
    }

    /// Chat node with a custom persona preamble.
    pub fn with_persona(api_key: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            persona: persona.into(),
        }
    }

    /// System preamble for a completion call: the persona, extended with
    /// the caller's profile when the server provided one.
    fn preamble(&self, snapshot: &StateSnapshot) -> String {
        match snapshot
            .extra
            .get(USER_PROFILE_KEY)
            .filter(|profile| !profile.is_null())
        {
            Some(profile) => format!("{} User info: {profile}", self.persona),
            None => self.persona.clone(),
        }
    }
}

/// Map a transcript message onto the provider's message model.
///
/// System prompts travel as the preamble, so system-role entries are
/// skipped here. Tool outputs replay as user-side content; the transcript
/// model does not track tool-call ids.
fn to_rig_message(message: &Message) -> Option<rig::completion::Message> {
    match message.role.as_str() {
        Message::SYSTEM => None,
        Message::ASSISTANT => Some(rig::completion::Message::assistant(
            message.content.clone(),
        )),
        _ => Some(rig::completion::Message::user(message.content.clone())),
    }
}

#[async_trait]
impl Node for ChatNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let (last, earlier) = snapshot
            .messages
            .split_last()
            .ok_or(NodeError::MissingInput { what: "messages" })?;
        let prompt = to_rig_message(last)
            .unwrap_or_else(|| rig::completion::Message::user(last.content.clone()));
        let history: Vec<rig::completion::Message> =
            earlier.iter().filter_map(to_rig_message).collect();

        let mut tool_definitions = builtin_tool_definitions();
        tool_definitions.extend(frontend_tool_definitions(&snapshot.extra));

        ctx.emit(
            "llm_call",
            format!(
                "Calling {} with {} transcript message(s)",
                self.model,
                snapshot.messages.len()
            ),
        )?;

        let client: openai::Client =
            openai::Client::new(&self.api_key).map_err(|e| NodeError::Provider {
                provider: "openai",
                message: format!("client construction failed: {}", e),
            })?;
        let completion_model = client.completion_model(&self.model);
        let completion_request = completion_model
            .completion_request(prompt)
            .preamble(self.preamble(&snapshot))
            .messages(history)
            .tools(tool_definitions)
            .build();

        let response = completion_model
            .completion(completion_request)
            .await
            .map_err(|e| NodeError::Provider {
                provider: "openai",
                message: format!("chat completion failed: {}", e),
            })?;

        let mut reply_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        for content in response.choice.into_iter() {
            match content {
                AssistantContent::Text(text) => reply_parts.push(text.text),
                AssistantContent::ToolCall(call) => tool_calls.push(ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                }),
                _ => {}
            }
        }
        let reply = reply_parts.join(" ");

        if tool_calls.is_empty() {
            ctx.emit_llm("openai", reply.clone())?;
            return Ok(NodePartial::new().with_messages(vec![Message::assistant(reply)]));
        }

        ctx.emit(
            "tool_request",
            format!("model requested {} tool call(s)", tool_calls.len()),
        )?;
        let mut extra = new_extra_map();
        extra.insert(
            PENDING_TOOL_CALLS_KEY.into(),
            serde_json::to_value(&tool_calls)?,
        );
        Ok(NodePartial::new()
            .with_messages(vec![Message::assistant(reply)])
            .with_extra(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VersionedState;
    use serde_json::json;

    fn node() -> ChatNode {
        ChatNode::new("sk-test")
    }

    #[test]
    fn preamble_without_profile_is_the_persona() {
        let snapshot = VersionedState::new_with_user_message("hi").snapshot();
        assert_eq!(node().preamble(&snapshot), DEFAULT_PERSONA);
    }

    #[test]
    fn preamble_appends_profile_json() {
        let state = VersionedState::builder()
            .with_user_message("hi")
            .with_extra(USER_PROFILE_KEY, json!({"name": "Ada"}))
            .build();
        let preamble = node().preamble(&state.snapshot());

        assert!(preamble.starts_with(DEFAULT_PERSONA));
        assert!(preamble.contains("User info:"));
        assert!(preamble.contains("\"name\":\"Ada\""));
    }

    #[test]
    fn null_profile_is_ignored() {
        let state = VersionedState::builder()
            .with_user_message("hi")
            .with_extra(USER_PROFILE_KEY, json!(null))
            .build();
        assert_eq!(node().preamble(&state.snapshot()), DEFAULT_PERSONA);
    }

    #[test]
    fn transcript_mapping_drops_system_and_keeps_order() {
        assert!(to_rig_message(&Message::system("rules")).is_none());
        assert!(to_rig_message(&Message::user("q")).is_some());
        assert!(to_rig_message(&Message::assistant("a")).is_some());
        assert!(to_rig_message(&Message::tool("output")).is_some());
    }
}
