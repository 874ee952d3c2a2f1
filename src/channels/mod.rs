//! Versioned state channels.
//!
//! A channel is a typed container with a monotonically increasing `u32`
//! version. Nodes never mutate channels directly: they return
//! [`NodePartial`](crate::node::NodePartial) updates which the barrier merges
//! through [reducers](crate::reducers), bumping a channel's version only when
//! its contents actually changed. The scheduler uses those versions to skip
//! nodes that have already seen the current state.
//!
//! Three channels make up a [`VersionedState`](crate::state::VersionedState):
//!
//! - [`MessagesChannel`]: the conversation transcript
//! - [`ExtrasChannel`]: JSON scratchpad (pending tool calls, profile data)
//! - [`ErrorsChannel`]: [`ErrorEvent`] records collected during a run

pub mod errors;

pub use errors::{ErrorEvent, ErrorScope, LadderError, pretty_print, pretty_print_with_mode};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;
use crate::types::ChannelType;

/// Common surface of a versioned state channel.
///
/// `snapshot()` deep-copies the payload so callers can hold onto state
/// without observing later mutations. Versions start at 1 and are managed by
/// the barrier, not by reducers or nodes.
pub trait Channel {
    /// Owned copy of the channel's contents.
    type Payload;

    /// Which channel this is, for reducer dispatch.
    fn get_channel_type(&self) -> ChannelType;

    /// Whether the channel's contents survive across steps.
    fn persistent(&self) -> bool {
        true
    }

    /// Current version counter.
    fn version(&self) -> u32;

    /// Overwrite the version counter. Reserved for the barrier.
    fn set_version(&mut self, version: u32);

    /// Deep copy of the current contents.
    fn snapshot(&self) -> Self::Payload;

    /// Number of entries currently held.
    fn len(&self) -> usize;

    /// Returns `true` when the channel holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered conversation transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagesChannel {
    messages: Vec<Message>,
    version: u32,
}

impl MessagesChannel {
    /// Creates a channel with explicit contents and version.
    #[must_use]
    pub fn new(messages: Vec<Message>, version: u32) -> Self {
        Self { messages, version }
    }

    /// Mutable access to the transcript. Reducer and test use only; regular
    /// updates flow through the barrier.
    pub fn get_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }
}

impl Default for MessagesChannel {
    fn default() -> Self {
        Self::new(Vec::new(), 1)
    }
}

impl Channel for MessagesChannel {
    type Payload = Vec<Message>;

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Message
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}

/// JSON key-value scratchpad shared between nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtrasChannel {
    extras: FxHashMap<String, Value>,
    version: u32,
}

impl ExtrasChannel {
    /// Creates a channel with explicit contents and version.
    #[must_use]
    pub fn new(extras: FxHashMap<String, Value>, version: u32) -> Self {
        Self { extras, version }
    }

    /// Mutable access to the map. Reducer and test use only.
    pub fn get_mut(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.extras
    }
}

impl Default for ExtrasChannel {
    fn default() -> Self {
        Self::new(FxHashMap::default(), 1)
    }
}

impl Channel for ExtrasChannel {
    type Payload = FxHashMap<String, Value>;

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Extra
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn snapshot(&self) -> FxHashMap<String, Value> {
        self.extras.clone()
    }

    fn len(&self) -> usize {
        self.extras.len()
    }
}

/// Error events accumulated over a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorsChannel {
    errors: Vec<ErrorEvent>,
    version: u32,
}

impl ErrorsChannel {
    /// Creates a channel with explicit contents and version.
    #[must_use]
    pub fn new(errors: Vec<ErrorEvent>, version: u32) -> Self {
        Self { errors, version }
    }

    /// Mutable access to the error list. Reducer and test use only.
    pub fn get_mut(&mut self) -> &mut Vec<ErrorEvent> {
        &mut self.errors
    }
}

impl Default for ErrorsChannel {
    fn default() -> Self {
        Self::new(Vec::new(), 1)
    }
}

impl Channel for ErrorsChannel {
    type Payload = Vec<ErrorEvent>;

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Error
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn snapshot(&self) -> Vec<ErrorEvent> {
        self.errors.clone()
    }

    fn len(&self) -> usize {
        self.errors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_version_one() {
        assert_eq!(MessagesChannel::default().version(), 1);
        assert_eq!(ExtrasChannel::default().version(), 1);
        assert_eq!(ErrorsChannel::default().version(), 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_writes() {
        let mut ch = MessagesChannel::default();
        ch.get_mut().push(Message::user("hello"));
        let snap = ch.snapshot();
        ch.get_mut()[0].content = "changed".into();
        assert_eq!(snap[0].content, "hello");
    }

    #[test]
    fn channel_types_match() {
        assert_eq!(
            MessagesChannel::default().get_channel_type(),
            ChannelType::Message
        );
        assert_eq!(
            ExtrasChannel::default().get_channel_type(),
            ChannelType::Extra
        );
        assert_eq!(
            ErrorsChannel::default().get_channel_type(),
            ChannelType::Error
        );
    }
}
