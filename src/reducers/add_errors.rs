use super::Reducer;
use crate::{node::NodePartial, state::VersionedState};

/// Appends error events from a partial onto the errors channel. The barrier
/// sorts merged errors before applying, so appended order is deterministic.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddErrors;
impl Reducer for AddErrors {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(errors_update) = &update.errors
            && !errors_update.is_empty()
        {
            state
                .errors
                .get_mut()
                .extend(errors_update.iter().cloned());
        }
    }
}
