use std::fmt;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scope label of the diagnostic event the runner publishes once a run has
/// finished. Streaming consumers stop reading after they see it.
pub const STREAM_END_SCOPE: &str = "__agentloom_stream_end__";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    Node(NodeEvent),
    Diagnostic(DiagnosticEvent),
    LLM(LlmOutputEvent),
}

impl Event {
    pub fn node_message(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Node(NodeEvent::new(None, None, scope.into(), message.into()))
    }

    pub fn node_message_with_meta(
        node_id: impl Into<String>,
        step: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Node(NodeEvent::new(
            Some(node_id.into()),
            Some(step),
            scope.into(),
            message.into(),
        ))
    }

    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn llm_output(
        node_id: impl Into<String>,
        step: u64,
        provider: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Event::LLM(LlmOutputEvent::new(
            Some(node_id.into()),
            Some(step),
            provider,
            content,
        ))
    }

    pub fn scope_label(&self) -> Option<&str> {
        match self {
            Event::Node(node) => Some(node.scope()),
            Event::Diagnostic(diag) => Some(diag.scope()),
            Event::LLM(_) => Some("llm"),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Event::Node(node) => node.message(),
            Event::Diagnostic(diag) => diag.message(),
            Event::LLM(llm) => llm.content(),
        }
    }

    /// Convert the event to a JSON value with a normalized schema.
    ///
    /// The result always has the same shape regardless of variant:
    /// ```json
    /// {
    ///   "type": "node" | "diagnostic" | "llm",
    ///   "scope": "scope_label",
    ///   "message": "event_message",
    ///   "timestamp": "2026-08-25T12:34:56.789Z",
    ///   "metadata": { /* variant-specific fields */ }
    /// }
    /// ```
    /// This is the schema SSE clients receive, so keep it stable.
    ///
    /// # Example
    ///
    /// ```
    /// use agentloom::event_bus::Event;
    ///
    /// let event = Event::node_message_with_meta("Custom:chat", 5, "chat", "calling model");
    /// let json = event.to_json_value();
    ///
    /// assert_eq!(json["type"], "node");
    /// assert_eq!(json["scope"], "chat");
    /// assert_eq!(json["message"], "calling model");
    /// assert_eq!(json["metadata"]["node_id"], "Custom:chat");
    /// assert_eq!(json["metadata"]["step"], 5);
    /// ```
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::json;

        let (event_type, metadata) = match self {
            Event::Node(node) => {
                let mut meta = serde_json::Map::new();
                if let Some(node_id) = node.node_id() {
                    meta.insert("node_id".to_string(), json!(node_id));
                }
                if let Some(step) = node.step() {
                    meta.insert("step".to_string(), json!(step));
                }
                ("node", Value::Object(meta))
            }
            Event::Diagnostic(_) => {
                let meta = serde_json::Map::new();
                ("diagnostic", Value::Object(meta))
            }
            Event::LLM(llm) => {
                let mut meta = serde_json::Map::new();
                if let Some(node_id) = llm.node_id() {
                    meta.insert("node_id".to_string(), json!(node_id));
                }
                if let Some(step) = llm.step() {
                    meta.insert("step".to_string(), json!(step));
                }
                meta.insert("provider".to_string(), json!(llm.provider()));
                for (key, value) in llm.metadata() {
                    meta.insert(key.clone(), value.clone());
                }
                ("llm", Value::Object(meta))
            }
        };

        let timestamp = match self {
            Event::LLM(llm) => llm.timestamp(),
            _ => Utc::now(),
        };

        json!({
            "type": event_type,
            "scope": self.scope_label(),
            "message": self.message(),
            "timestamp": timestamp.to_rfc3339(),
            "metadata": metadata,
        })
    }

    /// Convert the event to a compact JSON string.
    ///
    /// ```
    /// use agentloom::event_bus::Event;
    ///
    /// let event = Event::diagnostic("runner", "session started");
    /// let json_str = event.to_json_string().unwrap();
    /// assert!(json_str.contains("\"type\":\"diagnostic\""));
    /// ```
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json_value())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Node(node) => match (node.node_id(), node.step()) {
                (Some(id), Some(step)) => write!(f, "[{id}@{step}] {}", node.message()),
                (Some(id), None) => write!(f, "[{id}] {}", node.message()),
                (None, Some(step)) => write!(f, "[step {step}] {}", node.message()),
                (None, None) => write!(f, "{}", node.message()),
            },
            Event::Diagnostic(diag) => write!(f, "{}", diag.message()),
            Event::LLM(llm) => match llm.node_id() {
                Some(node_id) => write!(f, "[LLM {node_id}] {}", llm.content()),
                None => write!(f, "{}", llm.content()),
            },
        }
    }
}

/// Progress event published by a node while it runs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEvent {
    node_id: Option<String>,
    step: Option<u64>,
    scope: String,
    message: String,
}

impl NodeEvent {
    pub fn new(node_id: Option<String>, step: Option<u64>, scope: String, message: String) -> Self {
        Self {
            node_id,
            step,
            scope,
            message,
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn step(&self) -> Option<u64> {
        self.step
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Runtime-level event such as session lifecycle notices.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    scope: String,
    message: String,
}

impl DiagnosticEvent {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Provider output produced during a run, such as assistant text returned by
/// a completion call. Carries enough metadata for SSE clients to attribute
/// the text to a node and step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmOutputEvent {
    node_id: Option<String>,
    step: Option<u64>,
    provider: String,
    content: String,
    metadata: FxHashMap<String, Value>,
    timestamp: DateTime<Utc>,
}

impl LlmOutputEvent {
    pub fn new(
        node_id: Option<String>,
        step: Option<u64>,
        provider: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            step,
            provider: provider.into(),
            content: content.into(),
            metadata: FxHashMap::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn step(&self) -> Option<u64> {
        self.step
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &FxHashMap<String, Value> {
        &self.metadata
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn with_metadata(mut self, metadata: FxHashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}
