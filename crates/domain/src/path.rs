//! Dot-path lookups into JSON payloads (`client.name`, `items.0.price`).

use serde_json::Value;

/// Resolve `path` inside `value`.
///
/// Segments are separated by `.`; a numeric segment indexes into arrays.
/// Returns `None` as soon as a segment is missing, which callers treat as
/// "undefined" (distinct from an explicit JSON `null`).
#[must_use]
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a resolved value the way it should appear inside text.
///
/// Strings are inserted raw, `null` renders as an empty string, and
/// composite values fall back to compact JSON.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
