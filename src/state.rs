//! Versioned state for agent graph runs.
//!
//! State is organized into three independently versioned channels. Nodes read
//! an immutable [`StateSnapshot`] and return partial updates; the barrier
//! merges those updates back in and bumps versions when contents change.
//!
//! # Core Types
//!
//! - [`VersionedState`]: the mutable state container owned by the runtime
//! - [`StateSnapshot`]: point-in-time view handed to nodes
//!
//! # Channels
//!
//! - **messages**: the conversation transcript
//! - **extra**: JSON metadata (user profile, pending tool calls)
//! - **errors**: error events collected during the run
//!
//! # Examples
//!
//! ```rust
//! use agentloom::state::VersionedState;
//! use agentloom::channels::Channel;
//! use serde_json::json;
//!
//! let mut state = VersionedState::new_with_user_message("Hello!");
//! state
//!     .extra
//!     .get_mut()
//!     .insert("user_id".to_string(), json!("user_123"));
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.messages.len(), 1);
//! assert_eq!(snapshot.extra.get("user_id"), Some(&json!("user_123")));
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{
    channels::{Channel, ErrorsChannel, ExtrasChannel, MessagesChannel},
    message::Message,
};

/// The state container threaded through a graph run.
///
/// Each channel carries its own version number, used by the scheduler to
/// decide which nodes still need to run and by the barrier to detect change.
///
/// # Examples
///
/// ```rust
/// use agentloom::state::VersionedState;
/// use agentloom::message::Message;
/// use agentloom::channels::Channel;
/// use serde_json::json;
///
/// let mut state = VersionedState::new_with_user_message("What's the weather in Tokyo?");
/// state
///     .extra
///     .get_mut()
///     .insert("session_id".to_string(), json!("sess-1"));
/// state.messages.get_mut().push(Message::assistant("Let me check."));
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.messages.len(), 2);
/// assert_eq!(snapshot.extra.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedState {
    /// Conversation transcript.
    pub messages: MessagesChannel,
    /// Custom metadata and intermediate results.
    pub extra: ExtrasChannel,
    /// Error events recorded during the run.
    pub errors: ErrorsChannel,
}

/// Immutable view of state at a specific point in time.
///
/// Snapshots are created by [`VersionedState::snapshot()`] and passed to
/// nodes during execution. The data is cloned, so later mutations of the
/// live state never show through.
///
/// ```rust
/// use agentloom::state::VersionedState;
/// use agentloom::channels::Channel;
/// use serde_json::json;
///
/// let mut state = VersionedState::new_with_user_message("Hello");
/// state.extra.get_mut().insert("key".to_string(), json!("value"));
///
/// let snapshot = state.snapshot();
/// state.extra.get_mut().clear();
/// assert_eq!(snapshot.extra.get("key"), Some(&json!("value")));
/// ```
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    /// Messages at the time of snapshot.
    pub messages: Vec<Message>,
    /// Version of the messages channel when the snapshot was taken.
    pub messages_version: u32,
    /// Extra data at the time of snapshot.
    pub extra: FxHashMap<String, Value>,
    /// Version of the extra channel when the snapshot was taken.
    pub extra_version: u32,
    /// Error events at the time of snapshot.
    pub errors: Vec<crate::channels::errors::ErrorEvent>,
    /// Version of the errors channel when the snapshot was taken.
    pub errors_version: u32,
}

impl VersionedState {
    /// Creates state seeded with a single user message.
    ///
    /// This is the usual entry point for a fresh chat turn: one user message,
    /// empty extras and errors, all channels at version 1.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    ///
    /// let state = VersionedState::new_with_user_message("Tell me a joke");
    /// let snapshot = state.snapshot();
    ///
    /// assert_eq!(snapshot.messages.len(), 1);
    /// assert_eq!(snapshot.messages[0].role, "user");
    /// assert_eq!(snapshot.messages_version, 1);
    /// assert!(snapshot.extra.is_empty());
    /// ```
    pub fn new_with_user_message(user_text: &str) -> Self {
        let messages = vec![Message::user(user_text)];
        Self {
            messages: MessagesChannel::new(messages, 1),
            extra: ExtrasChannel::default(),
            errors: ErrorsChannel::default(),
        }
    }

    /// Creates state seeded with an existing transcript.
    ///
    /// Used when a request carries prior chat history that the graph should
    /// continue from.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    /// use agentloom::message::Message;
    ///
    /// let messages = vec![
    ///     Message::user("Explain error handling in Rust"),
    ///     Message::assistant("Use Result and the ? operator."),
    /// ];
    /// let state = VersionedState::new_with_messages(messages);
    /// let snapshot = state.snapshot();
    ///
    /// assert_eq!(snapshot.messages.len(), 2);
    /// assert_eq!(snapshot.messages_version, 1);
    /// ```
    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: MessagesChannel::new(messages, 1),
            extra: ExtrasChannel::default(),
            errors: ErrorsChannel::default(),
        }
    }

    /// Creates a builder for assembling state with several messages and
    /// extras.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    /// use serde_json::json;
    ///
    /// let state = VersionedState::builder()
    ///     .with_user_message("Hello, assistant!")
    ///     .with_assistant_message("Hello! How can I help you?")
    ///     .with_extra("session_id", json!("sess-1"))
    ///     .build();
    ///
    /// let snapshot = state.snapshot();
    /// assert_eq!(snapshot.messages.len(), 2);
    /// assert_eq!(snapshot.extra.len(), 1);
    /// ```
    pub fn builder() -> VersionedStateBuilder {
        VersionedStateBuilder::new()
    }

    /// Appends a message to the transcript without touching versions.
    /// Version bumps are the barrier's job.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    ///
    /// let mut state = VersionedState::new_with_user_message("Initial message");
    /// state.add_message("assistant", "I understand your request.");
    ///
    /// let snapshot = state.snapshot();
    /// assert_eq!(snapshot.messages.len(), 2);
    /// assert_eq!(snapshot.messages[1].role, "assistant");
    /// ```
    #[must_use = "consider using the returned self for method chaining"]
    pub fn add_message(&mut self, role: &str, content: &str) -> &mut Self {
        self.messages.get_mut().push(Message::new(role, content));
        self
    }

    /// Inserts a key-value pair into the extra channel without touching
    /// versions.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    /// use serde_json::json;
    ///
    /// let mut state = VersionedState::new_with_user_message("Test");
    /// state
    ///     .add_extra("user_id", json!("user_123"))
    ///     .add_extra("timestamp", json!(1234567890));
    ///
    /// let snapshot = state.snapshot();
    /// assert_eq!(snapshot.extra.len(), 2);
    /// ```
    #[must_use = "consider using the returned self for method chaining"]
    pub fn add_extra(&mut self, key: &str, value: Value) -> &mut Self {
        self.extra.get_mut().insert(key.to_string(), value);
        self
    }

    /// Clones the current channel contents and versions into a
    /// [`StateSnapshot`].
    ///
    /// O(n) in the amount of channel data; every superstep takes one
    /// snapshot per frontier.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            messages_version: self.messages.version(),
            extra: self.extra.snapshot(),
            extra_version: self.extra.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }
}

/// Fluent builder for [`VersionedState`].
///
/// Useful for request handlers and tests that need a transcript plus extras
/// in one expression.
///
/// ```rust
/// use agentloom::state::VersionedState;
/// use serde_json::json;
///
/// let state = VersionedState::builder()
///     .with_system_message("Weather tools enabled")
///     .with_user_message("What's the weather like?")
///     .with_extra("location", json!("Tokyo"))
///     .build();
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.messages.len(), 2);
/// assert_eq!(snapshot.extra.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct VersionedStateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl VersionedStateBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Adds a user message.
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Adds an assistant message.
    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Adds a system message.
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a message with an arbitrary role.
    ///
    /// ```rust
    /// use agentloom::state::VersionedState;
    ///
    /// let state = VersionedState::builder()
    ///     .with_message("tool", "{\"temp\": 22}")
    ///     .build();
    /// ```
    pub fn with_message(mut self, role: &str, content: &str) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Inserts metadata into the extra channel.
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Builds the final state. All channels start at version 1.
    pub fn build(self) -> VersionedState {
        VersionedState {
            messages: MessagesChannel::new(self.messages, 1),
            extra: ExtrasChannel::new(self.extra, 1),
            errors: ErrorsChannel::default(),
        }
    }
}
