//! Generic deep merge over JSON objects.
//!
//! Used when two backends both describe a capability with an options object.
//! The rules favour richer descriptions: a structured value beats a scalar,
//! lists are concatenated, and on a plain scalar conflict the value already
//! present is kept.

use serde_json::{Map, Value};

/// Whether `value` is a scalar (null, bool, number or string).
#[must_use]
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Merge `from` into `into`, destructively.
///
/// For each key of `from`:
/// - absent from `into`: inserted
/// - both objects: merged recursively
/// - both arrays: `from`'s elements appended
/// - one scalar, one structured: the structured value wins
/// - both scalars: `into` keeps its value
pub fn deep_merge(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, incoming) in from {
        match into.get_mut(&key) {
            None => {
                into.insert(key, incoming);
            }
            Some(existing) => merge_value(existing, incoming),
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(left), Value::Object(right)) => deep_merge(left, right),
        (Value::Array(left), Value::Array(right)) => left.extend(right),
        (existing, incoming) => {
            if is_scalar(existing) && !is_scalar(&incoming) {
                *existing = incoming;
            }
        }
    }
}
