//! Chat message types shared by state channels, graph nodes, and the HTTP
//! boundary.
//!
//! A [`Message`] is a role/content pair. Roles are plain strings so that
//! provider-specific or frontend-defined roles pass through untouched; the
//! common ones are available as constants ([`Message::USER`],
//! [`Message::ASSISTANT`], [`Message::SYSTEM`], [`Message::TOOL`]) with
//! matching convenience constructors.

use serde::{Deserialize, Serialize};

/// Single entry in a conversation transcript.
///
/// # Examples
///
/// ```rust
/// use agentloom::message::Message;
///
/// let question = Message::user("What's the weather in Tokyo?");
/// assert!(question.has_role(Message::USER));
///
/// let reply = Message::assistant("Let me check that for you.");
/// assert_eq!(reply.role, "assistant");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message (`"user"`, `"assistant"`, `"system"`,
    /// `"tool"`, or any custom label).
    pub role: String,
    /// The message body.
    pub content: String,
}

impl Message {
    /// Role for end-user input.
    pub const USER: &'static str = "user";
    /// Role for model output.
    pub const ASSISTANT: &'static str = "assistant";
    /// Role for system instructions.
    pub const SYSTEM: &'static str = "system";
    /// Role for tool execution results fed back to the model.
    pub const TOOL: &'static str = "tool";

    /// Creates a message with an arbitrary role.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-result message.
    #[must_use]
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Self::TOOL, content)
    }

    /// Checks whether this message carries the given role.
    ///
    /// ```rust
    /// use agentloom::message::Message;
    ///
    /// let msg = Message::system("You are a helpful assistant.");
    /// assert!(msg.has_role(Message::SYSTEM));
    /// assert!(!msg.has_role(Message::USER));
    /// ```
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_accessors() {
        let msg = Message::new("reviewer", "looks good");
        assert_eq!(msg.role, "reviewer");
        assert_eq!(msg.content, "looks good");
    }

    #[test]
    fn convenience_constructors_set_roles() {
        assert_eq!(Message::user("q").role, Message::USER);
        assert_eq!(Message::assistant("a").role, Message::ASSISTANT);
        assert_eq!(Message::system("s").role, Message::SYSTEM);
        assert_eq!(Message::tool("t").role, Message::TOOL);
    }

    #[test]
    fn role_checking() {
        let msg = Message::tool("The weather in Tokyo is sunny, 22°C.");
        assert!(msg.has_role(Message::TOOL));
        assert!(!msg.has_role(Message::ASSISTANT));
        assert!(!msg.has_role("TOOL"));
    }

    #[test]
    fn equality_and_clone() {
        let a = Message::user("same");
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Message::assistant("same"));
    }

    #[test]
    fn serde_roundtrip() {
        let msg = Message::assistant("stream me");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
