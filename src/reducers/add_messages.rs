use super::Reducer;
use crate::{node::NodePartial, state::VersionedState};

/// Appends transcript messages from a partial onto the messages channel.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddMessages;
impl Reducer for AddMessages {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(messages_update) = &update.messages
            && !messages_update.is_empty()
        {
            state
                .messages
                .get_mut()
                .extend(messages_update.iter().cloned());
        }
    }
}
