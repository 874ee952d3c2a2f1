use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::telemetry::{FormatterMode, PlainFormatter, TelemetryFormatter};

// Scope kinds are stored in encoded string form ("Custom:chat") so this file
// does not need serde support on NodeKind.

/// An error recorded on the errors channel: when it happened, where in the
/// runtime it happened, the error chain itself, and free-form tags/context.
///
/// # JSON Serialization Format
///
/// ```json
/// {
///   "when": "2026-08-25T10:30:00Z",
///   "scope": { "scope": "node", "kind": "Custom:chat", "step": 1 },
///   "error": {
///     "message": "completion request failed",
///     "cause": { "message": "connection reset", "cause": null, "details": null },
///     "details": {"provider": "openai"}
///   },
///   "tags": ["provider", "retryable"],
///   "context": {"session": "sess-1"}
/// }
/// ```
///
/// The `scope` field is a tagged union discriminated by `"scope"`:
/// - `"node"`: carries `kind` (encoded node name) and `step`
/// - `"scheduler"`: carries `step`
/// - `"runner"`: carries `session` and `step`
/// - `"app"`: no additional fields
///
/// # Examples
///
/// ```
/// use agentloom::channels::errors::{ErrorEvent, LadderError};
/// use serde_json::json;
///
/// let event = ErrorEvent::node("Custom:chat", 1, LadderError::msg("completion failed"))
///     .with_tag("provider")
///     .with_context(json!({"model": "gpt-4o"}));
///
/// let json_str = serde_json::to_string(&event).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: LadderError,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// Create a node-scoped error event.
    ///
    /// ```
    /// use agentloom::channels::errors::{ErrorEvent, LadderError};
    ///
    /// let err = ErrorEvent::node("Custom:tools", 2, LadderError::msg("unknown tool"));
    /// ```
    pub fn node<S: Into<String>>(kind: S, step: u64, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                kind: kind.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a scheduler-scoped error event.
    pub fn scheduler(step: u64, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Scheduler { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a runner-scoped error event.
    ///
    /// ```
    /// use agentloom::channels::errors::{ErrorEvent, LadderError};
    ///
    /// let err = ErrorEvent::runner("sess-42", 10, LadderError::msg("barrier failed"));
    /// ```
    pub fn runner<S: Into<String>>(session: S, step: u64, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner {
                session: session.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create an app-scoped error event.
    pub fn app(error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::App,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Replace the tag list on this error event.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Append a single tag to this error event.
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach context metadata to this error event.
    ///
    /// ```
    /// use agentloom::channels::errors::{ErrorEvent, LadderError};
    /// use serde_json::json;
    ///
    /// let err = ErrorEvent::node("Custom:chat", 1, LadderError::msg("empty response"))
    ///     .with_context(json!({"session": "sess-1"}));
    /// ```
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        kind: String,
        step: u64,
    },
    Scheduler {
        step: u64,
    },
    Runner {
        session: String,
        step: u64,
    },
    #[default]
    App,
}

/// A chainable error value: a message, an optional boxed cause, and optional
/// structured details. Named for the cause ladder it forms when nested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LadderError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<LadderError>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for LadderError {
    fn default() -> Self {
        LadderError {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for LadderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LadderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl LadderError {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        LadderError {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: LadderError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Format error events with explicit color mode control.
///
/// - [`FormatterMode::Auto`]: colors when stderr is a TTY
/// - [`FormatterMode::Colored`]: always includes ANSI codes
/// - [`FormatterMode::Plain`]: never includes ANSI codes
///
/// # Examples
///
/// ```
/// use agentloom::channels::errors::{ErrorEvent, LadderError, pretty_print_with_mode};
/// use agentloom::telemetry::FormatterMode;
///
/// let events = vec![
///     ErrorEvent::node("Custom:chat", 1, LadderError::msg("completion failed"))
/// ];
///
/// let plain = pretty_print_with_mode(&events, FormatterMode::Plain);
/// assert!(!plain.contains("\x1b["));
/// ```
pub fn pretty_print_with_mode(events: &[ErrorEvent], mode: FormatterMode) -> String {
    let formatter = PlainFormatter::with_mode(mode);
    let renders = formatter.render_errors(events);
    let mut out = String::new();
    for (idx, render) in renders.into_iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for line in render.lines {
            out.push_str(&line);
        }
    }
    out
}

/// Format error events as human-readable text with auto-detected color
/// support. For explicit control use [`pretty_print_with_mode`].
pub fn pretty_print(events: &[ErrorEvent]) -> String {
    pretty_print_with_mode(events, FormatterMode::Auto)
}
