//! Recursive JSON flattening.
//!
//! Arbitrary nested documents become an ordered list of (dotted key-path,
//! stringified leaf) pairs, rendered as `path: value` lines for embedding.

use serde_json::Value;

/// Flatten a JSON value into ordered (path, value) pairs.
///
/// Object keys keep their document order, array elements use their index as
/// a path segment, and scalar leaves are stringified. A bare scalar at the
/// root yields one pair with an empty path.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(value, String::new(), &mut pairs);
    pairs
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, join_path(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, join_path(&prefix, &index.to_string()), out);
            }
        }
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Null => out.push((prefix, "None".to_string())),
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Render flattened pairs as one `path: value` line per leaf.
pub fn render(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(path, value)| format!("{}: {}", path, value))
        .collect::<Vec<_>>()
        .join("\n")
}
