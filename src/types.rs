//! Core identifiers for conversation graphs.
//!
//! This module defines the two fundamental identifier types used throughout
//! the crate: [`NodeKind`] names a node in an agent's graph, and
//! [`ChannelType`] names one of the versioned state channels.
//!
//! # Examples
//!
//! ```rust
//! use agentloom::types::{NodeKind, ChannelType};
//!
//! let chat = NodeKind::Custom("chat".to_string());
//! assert_eq!(chat.encode(), "Custom:chat");
//!
//! let channel = ChannelType::Message;
//! assert_eq!(channel.to_string(), "message");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within an agent's conversation graph.
///
/// `Start` and `End` are virtual: they carry no [`Node`](crate::node::Node)
/// implementation. Execution begins at the targets of `Start`'s edges and a
/// branch finishes when it routes to `End`. All real work happens in
/// `Custom` nodes such as the chat and tool steps.
///
/// # Examples
///
/// ```rust
/// use agentloom::types::NodeKind;
///
/// let chat = NodeKind::Custom("chat".to_string());
/// let decoded = NodeKind::decode(&chat.encode());
/// assert_eq!(chat, decoded);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry point. The first edge of every graph leaves from here.
    Start,
    /// Virtual terminal. Routing here completes the branch.
    End,
    /// Application node identified by a user-defined name.
    Custom(String),
}

impl NodeKind {
    /// Encode a `NodeKind` into its stable string form.
    ///
    /// - `Start` → `"Start"`
    /// - `End` → `"End"`
    /// - `Custom("chat")` → `"Custom:chat"`
    ///
    /// This form appears in error scopes and scheduler bookkeeping.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::Start => "Start".to_string(),
            NodeKind::End => "End".to_string(),
            NodeKind::Custom(s) => format!("Custom:{s}"),
        }
    }

    /// Decode the string form back into a `NodeKind`.
    ///
    /// Unrecognized input falls back to `Custom(s)` so older encodings keep
    /// resolving.
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeKind::Start
        } else if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Custom:") {
            NodeKind::Custom(rest.to_string())
        } else {
            NodeKind::Custom(s.to_string())
        }
    }

    /// Returns `true` if this is the virtual [`Start`](Self::Start) node.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the virtual [`End`](Self::End) node.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is a custom node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Target string for conditional-edge predicates.
    ///
    /// Predicates return node names as strings; this produces the form the
    /// runner resolves (`"Start"`, `"End"`, or the custom name).
    #[must_use]
    pub fn as_target(&self) -> String {
        self.to_string()
    }

    /// Target string routing to [`End`](Self::End), for use in predicates.
    #[must_use]
    pub fn end_target() -> String {
        NodeKind::End.as_target()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Allow string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

/// Identifies one of the versioned state channels.
///
/// Each channel type has its own reducer and update semantics; see
/// [`crate::reducers`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// The conversation transcript.
    Message,
    /// Error events collected during a run.
    Error,
    /// Key-value scratchpad shared between nodes (pending tool calls,
    /// profile data, run metadata).
    Extra,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Error => write!(f, "error"),
            Self::Extra => write!(f, "extra"),
        }
    }
}
