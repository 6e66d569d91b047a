//! Log-safe sanitization of a tool call's input payload (spec.md §4.11
//! step 6): every string value over [`MAX_STRING_LEN`] characters anywhere
//! in the JSON tree is truncated with an elision marker, so a single huge
//! file-write payload can't blow out the event log or tracing output.

const MAX_STRING_LEN: usize = 500;

fn truncate_string(value: &str) -> String {
    if value.chars().count() <= MAX_STRING_LEN {
        return value.to_string();
    }
    let head: String = value.chars().take(MAX_STRING_LEN).collect();
    format!("{head}... [truncated {} more chars]", value.chars().count() - MAX_STRING_LEN)
}

/// Recursively walk `value`, truncating long strings wherever they occur
/// (object values, array elements, or the top level).
pub fn sanitize_for_log(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => serde_json::Value::String(truncate_string(text)),
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(sanitize_for_log).collect()),
        serde_json::Value::Object(map) => {
            serde_json::Value::Object(map.iter().map(|(key, val)| (key.clone(), sanitize_for_log(val))).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "sanitize.test.rs"]
mod tests;
