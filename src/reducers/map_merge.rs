use super::Reducer;
use crate::{node::NodePartial, state::VersionedState};

/// Shallow-merges a partial's extra map into the extra channel. Existing
/// keys are overwritten, which means partials applied later in run order
/// win.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct MapMerge;
impl Reducer for MapMerge {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(extras_update) = &update.extra
            && !extras_update.is_empty()
        {
            let state_map = state.extra.get_mut();
            for (k, v) in extras_update.iter() {
                state_map.insert(k.clone(), v.clone());
            }
        }
    }
}
