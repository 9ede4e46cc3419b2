//! Field-by-field merge of a fresh projection into an existing destination record
//!
//! Only non-empty, truthy source values overwrite. A later, thinner legacy row
//! must never blank out data an earlier run already migrated.

use crate::destination::Document;
use serde_json::Value;

/// Whether a value carries information worth writing
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Merge `source` into `target`, recursing into nested objects.
///
/// Returns whether `target` changed.
pub fn merge_into(target: &mut Document, source: &Document) -> bool {
    let mut changed = false;
    for (key, value) in source {
        if !is_truthy(value) {
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                changed |= merge_into(existing, incoming);
            }
            (Some(existing), _) if existing == value => {}
            _ => {
                target.insert(key.clone(), value.clone());
                changed = true;
            }
        }
    }
    changed
}

/// Drop null fields and objects left empty by doing so
pub fn compact(document: &mut Document) {
    document.retain(|_, value| {
        if let Value::Object(nested) = value {
            compact(nested);
            return !nested.is_empty();
        }
        !value.is_null()
    });
}
