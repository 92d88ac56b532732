//! Overlaying one parsed layer onto the accumulated config value.

use serde_json::Value;

/// Overlay `layer` onto `base` and return how many values the layer set.
///
/// Objects merge key by key. Anything else, arrays included, replaces what
/// the lower layers had, so a layer that lists `recall_patterns` owns the
/// whole list.
pub(super) fn overlay(base: &mut Value, layer: &Value) -> usize {
    match (base, layer) {
        (Value::Object(target), Value::Object(source)) => source
            .iter()
            .map(|(key, value)| {
                let slot = target.entry(key.clone()).or_insert(Value::Null);
                overlay(slot, value)
            })
            .sum(),
        (slot, value) => {
            *slot = value.clone();
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_arrays_replace() {
        let mut base = json!({
            "memory": { "window_size": 4, "triggers": { "recall_patterns": ["a", "b"] } },
            "backends": { "search_index": "base" }
        });
        let set = overlay(
            &mut base,
            &json!({ "memory": { "top_k": 2, "triggers": { "recall_patterns": ["c"] } } }),
        );
        assert_eq!(set, 2);
        assert_eq!(
            base,
            json!({
                "memory": {
                    "window_size": 4,
                    "top_k": 2,
                    "triggers": { "recall_patterns": ["c"] }
                },
                "backends": { "search_index": "base" }
            })
        );
    }
}
