//! Tool definitions, dispatch, and the tool-executor node.
//!
//! Two kinds of tools exist. Built-in tools are executed by this backend;
//! frontend tools arrive as definitions in run state, are offered to the
//! model, and their calls are returned to the client unexecuted. The only
//! built-in today is a canned weather lookup.

use async_trait::async_trait;
use rig::completion::ToolDefinition;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;

/// Extra-channel key holding tool calls the model requested but the run
/// has not executed yet.
pub const PENDING_TOOL_CALLS_KEY: &str = "pending_tool_calls";

/// Extra-channel key holding frontend-supplied tool definitions.
pub const FRONTEND_TOOLS_KEY: &str = "tools";

/// Name of the built-in weather tool.
pub const WEATHER_TOOL: &str = "get_weather";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Canned weather lookup.
pub fn get_weather(location: &str) -> String {
    format!("The weather in {location} is sunny, 22°C.")
}

/// Definitions for the tools this backend executes itself.
pub fn builtin_tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: WEATHER_TOOL.to_string(),
        description: "Get the weather for a given location.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location to get the weather for.",
                }
            },
            "required": ["location"],
        }),
    }]
}

/// Parse frontend-supplied tool definitions out of run state.
///
/// Entries without a name are dropped. A missing description or parameter
/// schema falls back to an empty value so a sparse definition still binds.
pub fn frontend_tool_definitions(extra: &FxHashMap<String, Value>) -> Vec<ToolDefinition> {
    let Some(items) = extra.get(FRONTEND_TOOLS_KEY).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            Some(ToolDefinition {
                name,
                description: item
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                parameters: item
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            })
        })
        .collect()
}

/// Read pending tool calls out of run state.
///
/// Absent or malformed entries yield an empty list rather than an error;
/// the chat node owns the key and always writes a well-formed array.
pub fn pending_tool_calls(extra: &FxHashMap<String, Value>) -> Vec<ToolCall> {
    extra
        .get(PENDING_TOOL_CALLS_KEY)
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

/// Execute a single tool call and return its textual output.
///
/// An unknown tool name produces a fallback message instead of an error,
/// so a model inventing a tool cannot wedge the run.
pub fn execute_tool(call: &ToolCall) -> String {
    match call.name.as_str() {
        WEATHER_TOOL => {
            let location = call
                .arguments
                .get("location")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            get_weather(location)
        }
        other => format!("No such tool: {other}"),
    }
}

/// Node that drains pending tool calls, executes each in request order,
/// and appends the outputs to the transcript as tool-role messages.
///
/// After execution the pending list is cleared so the routing predicate
/// sends the next superstep back to the chat node without looping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolExecutorNode;

#[async_trait]
impl Node for ToolExecutorNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let pending = pending_tool_calls(&snapshot.extra);
        if pending.is_empty() {
            ctx.emit("tools", "no pending tool calls")?;
            return Ok(NodePartial::new());
        }

        let mut outputs = Vec::with_capacity(pending.len());
        for call in &pending {
            ctx.emit("tool_call", format!("{}({})", call.name, call.arguments))?;
            outputs.push(Message::tool(execute_tool(call)));
        }

        let mut extra = new_extra_map();
        extra.insert(PENDING_TOOL_CALLS_KEY.into(), json!([]));
        Ok(NodePartial::new().with_messages(outputs).with_extra(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;

    fn test_ctx(bus: &EventBus) -> NodeContext {
        NodeContext {
            node_id: "tools".to_string(),
            step: 1,
            event_emitter: bus.get_emitter(),
        }
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn weather_tool_formats_location() {
        let output = execute_tool(&call(WEATHER_TOOL, json!({"location": "Tokyo"})));
        assert_eq!(output, "The weather in Tokyo is sunny, 22°C.");
    }

    #[test]
    fn unknown_tool_yields_fallback_message() {
        let output = execute_tool(&call("launch_rocket", json!({})));
        assert_eq!(output, "No such tool: launch_rocket");
    }

    #[test]
    fn frontend_definitions_skip_nameless_entries() {
        let mut extra = new_extra_map();
        extra.insert(
            FRONTEND_TOOLS_KEY.into(),
            json!([
                {"name": "search", "description": "Search the web."},
                {"description": "no name, dropped"},
            ]),
        );

        let defs = frontend_tool_definitions(&extra);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "search");
        assert_eq!(defs[0].parameters["type"], "object");
    }

    #[test]
    fn pending_calls_survive_a_round_trip() {
        let calls = vec![call(WEATHER_TOOL, json!({"location": "Osaka"}))];
        let mut extra = new_extra_map();
        extra.insert(
            PENDING_TOOL_CALLS_KEY.into(),
            serde_json::to_value(&calls).unwrap(),
        );

        assert_eq!(pending_tool_calls(&extra), calls);
    }

    #[tokio::test]
    async fn executor_appends_outputs_and_clears_pending() {
        let bus = EventBus::default();
        let mut extra = new_extra_map();
        extra.insert(
            PENDING_TOOL_CALLS_KEY.into(),
            json!([
                {"id": "call_1", "name": WEATHER_TOOL, "arguments": {"location": "Kyoto"}},
                {"id": "call_2", "name": "nonexistent", "arguments": {}},
            ]),
        );
        let snapshot = StateSnapshot {
            messages: vec![Message::user("weather please")],
            messages_version: 1,
            extra,
            extra_version: 2,
            errors: vec![],
            errors_version: 1,
        };

        let partial = ToolExecutorNode
            .run(snapshot, test_ctx(&bus))
            .await
            .unwrap();

        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.has_role(Message::TOOL)));
        assert_eq!(messages[0].content, "The weather in Kyoto is sunny, 22°C.");
        assert_eq!(messages[1].content, "No such tool: nonexistent");

        let extra = partial.extra.unwrap();
        assert_eq!(extra[PENDING_TOOL_CALLS_KEY], json!([]));
    }

    #[tokio::test]
    async fn executor_is_a_no_op_without_pending_calls() {
        let bus = EventBus::default();
        let snapshot = StateSnapshot {
            messages: vec![],
            messages_version: 1,
            extra: new_extra_map(),
            extra_version: 1,
            errors: vec![],
            errors_version: 1,
        };

        let partial = ToolExecutorNode
            .run(snapshot, test_ctx(&bus))
            .await
            .unwrap();

        assert!(partial.messages.is_none());
        assert!(partial.extra.is_none());
    }
}
