//! Named agents and the graphs behind them.
//!
//! Each agent pairs a compiled [`App`] with the name and description the
//! HTTP API reports. The live agents share one topology: the chat node
//! runs, a conditional edge routes to the tool executor whenever the model
//! requested tool calls, and the executor loops back to chat.

use std::sync::Arc;

use crate::agents::chat::ChatNode;
use crate::agents::mock::MockChatNode;
use crate::agents::tools::{ToolExecutorNode, pending_tool_calls};
use crate::app::App;
use crate::config::Settings;
use crate::graphs::{GraphBuilder, GraphCompileError};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Persona for the joke agent.
pub const COMEDIAN_PERSONA: &str =
    "You are a comedian. Answer with a short joke that fits the conversation.";

/// A named agent: a compiled graph plus the metadata the API reports.
#[derive(Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    pub graph: App,
}

/// Registry of agents keyed by name.
///
/// Registration order is preserved so listings stay stable across boots.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Register an agent. A duplicate name replaces the earlier entry in
    /// place.
    pub fn register(&mut self, agent: AgentDefinition) {
        match self.agents.iter_mut().find(|a| a.name == agent.name) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    /// Look up an agent by name.
    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Registered agents in registration order.
    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// The default registry, backed by the hosted provider.
    ///
    /// An empty API key still builds; affected agents fail at call time
    /// with a provider error instead of refusing to boot.
    pub fn live(settings: &Settings) -> Result<Self, GraphCompileError> {
        let mut registry = Self::new();
        registry.register(AgentDefinition {
            name: "sample_agent".to_string(),
            description: "A helpful assistant agent.".to_string(),
            graph: chat_graph(&settings.openai_api_key)?,
        });
        registry.register(AgentDefinition {
            name: "joke_agent".to_string(),
            description: "A comedian agent that tells jokes.".to_string(),
            graph: joke_graph(&settings.openai_api_key)?,
        });
        Ok(registry)
    }

    /// Registry for offline development and tests: one mock agent, no
    /// provider calls.
    pub fn mock() -> Result<Self, GraphCompileError> {
        let mut registry = Self::new();
        registry.register(AgentDefinition {
            name: "sample_agent".to_string(),
            description: "A helpful assistant agent.".to_string(),
            graph: mock_chat_graph()?,
        });
        Ok(registry)
    }
}

/// Chat agent graph with the default persona.
pub fn chat_graph(api_key: &str) -> Result<App, GraphCompileError> {
    persona_graph(ChatNode::new(api_key))
}

/// Chat agent graph with the comedian persona. Same topology as
/// [`chat_graph`].
pub fn joke_graph(api_key: &str) -> Result<App, GraphCompileError> {
    persona_graph(ChatNode::with_persona(api_key, COMEDIAN_PERSONA))
}

/// `Start -> chat`, `tools -> chat`, and a conditional edge on `chat`
/// that routes to `tools` while calls are pending and to `End` otherwise.
fn persona_graph(chat: ChatNode) -> Result<App, GraphCompileError> {
    let chat_kind = NodeKind::Custom("chat".into());
    let tools_kind = NodeKind::Custom("tools".into());
    GraphBuilder::new()
        .add_node(chat_kind.clone(), chat)
        .add_node(tools_kind.clone(), ToolExecutorNode)
        .add_edge(NodeKind::Start, chat_kind.clone())
        .add_edge(tools_kind.clone(), chat_kind.clone())
        .add_conditional_edge(
            chat_kind,
            Arc::new(move |snapshot: StateSnapshot| {
                if pending_tool_calls(&snapshot.extra).is_empty() {
                    vec![NodeKind::end_target()]
                } else {
                    vec![tools_kind.as_target()]
                }
            }),
        )
        .compile()
}

/// Offline graph: `Start -> chat -> End` over the mock node.
pub fn mock_chat_graph() -> Result<App, GraphCompileError> {
    let chat_kind = NodeKind::Custom("chat".into());
    GraphBuilder::new()
        .add_node(chat_kind.clone(), MockChatNode)
        .add_edge(NodeKind::Start, chat_kind.clone())
        .add_edge(chat_kind, NodeKind::End)
        .compile()
}
