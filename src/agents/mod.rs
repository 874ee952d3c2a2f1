//! Agent graphs and the registry the server serves them from.
//!
//! An agent is a compiled [`App`](crate::app::App) plus the metadata the
//! API reports. The chat agents wire an LLM node and a tool executor into
//! a small loop: the model runs, tool calls it requests are executed, and
//! the model runs again with the outputs until it answers in plain text.

pub mod chat;
pub mod mock;
pub mod registry;
pub mod tools;

pub use chat::{ChatNode, DEFAULT_PERSONA, USER_PROFILE_KEY};
pub use mock::{MOCK_RESPONSES, MockChatNode};
pub use registry::{
    AgentDefinition, AgentRegistry, COMEDIAN_PERSONA, chat_graph, joke_graph, mock_chat_graph,
};
pub use tools::{
    FRONTEND_TOOLS_KEY, PENDING_TOOL_CALLS_KEY, ToolCall, ToolExecutorNode, WEATHER_TOOL,
};
