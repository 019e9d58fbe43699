//! JSON merge helper for layered configuration.

use serde_json::Value;

/// Merge overlay values into the base. Objects merge key by key; any other
/// overlay value (including arrays) replaces the base value.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let mut base = json!({ "memory": { "path": "a.db", "search_limit": 5 } });
        merge_json_values(
            &mut base,
            &json!({ "memory": { "search_limit": 8 }, "embedding": { "enabled": false } }),
        );
        assert_eq!(
            base,
            json!({
                "memory": { "path": "a.db", "search_limit": 8 },
                "embedding": { "enabled": false }
            })
        );
    }
}
