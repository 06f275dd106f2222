// ── Ordered JSON rendering ──
//
// Controller resources serialize their keys in whatever order the API
// returns them. For detail views we normalize to a fixed ordering: the
// well-known identity and layout keys first, then everything else
// alphabetically. Applied recursively.

use serde_json::{Map, Value};

/// Keys rendered first, in this order, at every nesting level.
const KEY_PRIORITY: [&str; 15] = [
    "id",
    "name",
    "roomID",
    "view",
    "type",
    "baseType",
    "enabled",
    "visible",
    "isPlugin",
    "parentId",
    "viewXml",
    "hasUIView",
    "configXml",
    "interfaces",
    "properties",
];

/// Recursively reorder object keys: priority keys first, the remainder
/// alphabetical. Arrays keep their order but their elements are reordered.
pub fn reorder(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(reorder_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(reorder).collect()),
        other => other.clone(),
    }
}

fn reorder_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut ordered = Map::new();
    for key in KEY_PRIORITY {
        if let Some(value) = map.get(key) {
            ordered.insert(key.to_owned(), reorder(value));
        }
    }
    let mut rest: Vec<&String> = map
        .keys()
        .filter(|k| !KEY_PRIORITY.contains(&k.as_str()))
        .collect();
    rest.sort();
    for key in rest {
        if let Some(value) = map.get(key) {
            ordered.insert(key.clone(), reorder(value));
        }
    }
    ordered
}

/// Pretty-print with the key ordering applied.
pub fn to_pretty_ordered(value: &Value) -> String {
    serde_json::to_string_pretty(&reorder(value)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn priority_keys_come_first_then_alphabetical() {
        let input = json!({
            "zzz": 1,
            "name": "Lamp",
            "aaa": 2,
            "id": 7,
            "properties": {"value": true}
        });
        let ordered = reorder(&input);
        let keys: Vec<&String> = ordered
            .as_object()
            .expect("object")
            .keys()
            .collect();
        assert_eq!(keys, ["id", "name", "properties", "aaa", "zzz"]);
    }

    #[test]
    fn nested_objects_and_arrays_are_reordered() {
        let input = json!({
            "items": [{"visible": true, "id": 1}, {"name": "b", "extra": 0}]
        });
        let text = to_pretty_ordered(&input);
        let id_pos = text.find("\"id\"").expect("id present");
        let visible_pos = text.find("\"visible\"").expect("visible present");
        assert!(id_pos < visible_pos);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(reorder(&json!(42)), json!(42));
        assert_eq!(reorder(&json!("x")), json!("x"));
    }
}
