use serde_json::{Map, Value};

/// Settings after `settings[key][doctype] = value`. The input is left as is.
pub fn merge_setting(
    settings: &Map<String, Value>,
    key: &str,
    doctype: &str,
    value: Value,
) -> Map<String, Value> {
    let mut merged = settings.clone();
    let slot = merged
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(per_doctype) = slot {
        per_doctype.insert(doctype.to_string(), value);
    }
    merged
}

/// `settings.GridView[doctype]`, or an empty object.
pub fn grid_view(settings: &Map<String, Value>, doctype: &str) -> Value {
    settings
        .get("GridView")
        .and_then(|g| g.get(doctype))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}
