//! Request payloads for the agent-run API.

use serde::Deserialize;
use serde_json::Value;

use crate::agents::{FRONTEND_TOOLS_KEY, USER_PROFILE_KEY};
use crate::message::Message;
use crate::state::VersionedState;
use crate::utils::id_generator::IdGenerator;

/// Body of a `POST /copilotkit/{agent_name}` request.
///
/// Every field is optional on the wire; missing ids are generated so a
/// bare `{}` body still starts a run. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunAgentInput {
    pub thread_id: String,
    pub run_id: String,
    pub messages: Vec<InputMessage>,
    pub tools: Vec<Value>,
    pub state: Value,
}

impl Default for RunAgentInput {
    fn default() -> Self {
        let ids = IdGenerator::new();
        Self {
            thread_id: ids.generate_thread_id(),
            run_id: ids.generate_run_id(),
            messages: Vec::new(),
            tools: Vec::new(),
            state: Value::Null,
        }
    }
}

/// A transcript entry supplied by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputMessage {
    pub role: String,
    pub content: String,
}

impl Default for InputMessage {
    fn default() -> Self {
        Self {
            role: Message::USER.to_string(),
            content: String::new(),
        }
    }
}

impl RunAgentInput {
    /// Build the initial run state for this request.
    ///
    /// Client-supplied `state` entries are applied first and the
    /// server-controlled keys afterwards, so a client cannot spoof its
    /// identity or profile through the state object.
    pub fn into_initial_state(self, user_id: &str, user_profile: Value) -> VersionedState {
        let mut builder = VersionedState::builder();
        for message in &self.messages {
            builder = builder.with_message(&message.role, &message.content);
        }
        if let Some(state) = self.state.as_object() {
            for (key, value) in state {
                builder = builder.with_extra(key, value.clone());
            }
        }
        builder
            .with_extra("thread_id", Value::String(self.thread_id))
            .with_extra("run_id", Value::String(self.run_id))
            .with_extra(FRONTEND_TOOLS_KEY, Value::Array(self.tools))
            .with_extra("user_id", Value::String(user_id.to_string()))
            .with_extra(USER_PROFILE_KEY, user_profile)
            .build()
    }
}
