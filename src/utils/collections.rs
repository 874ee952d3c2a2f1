//! Constructors for the map types used across channels and node partials.
//!
//! The crate stores unstructured per-run data as
//! `FxHashMap<String, serde_json::Value>`. Spelling that type out at every
//! construction site is noisy; these helpers keep call sites short and make
//! it obvious the fast non-cryptographic hasher is intended.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// New empty extra-data map.
///
/// # Examples
/// ```
/// use agentloom::utils::collections::new_extra_map;
/// use serde_json::json;
///
/// let mut extra = new_extra_map();
/// extra.insert("user_profile".to_string(), json!({"name": "Ada"}));
/// assert_eq!(extra.len(), 1);
/// ```
#[must_use]
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_map_starts_empty() {
        let map = new_extra_map();
        assert!(map.is_empty());
    }

    #[test]
    fn extra_map_accepts_json_values() {
        let mut map = new_extra_map();
        map.insert("k".into(), json!([1, 2, 3]));
        assert_eq!(map["k"], json!([1, 2, 3]));
    }
}
