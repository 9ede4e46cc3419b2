//! Tolerant cell decoding
//!
//! The same logical column was serialized differently across export runs: an
//! integer may arrive as a JSON number or a numeric string, a flag as a bool or
//! `0`/`1`. Every accessor here decodes from the value's runtime shape and
//! returns `None` for null, blank, or undecodable cells.

use crate::snapshot::RawRow;
use serde_json::Value;

pub trait RowExt {
    fn int(&self, column: &str) -> Option<i64>;
    fn float(&self, column: &str) -> Option<f64>;
    fn text(&self, column: &str) -> Option<String>;
    fn flag(&self, column: &str) -> Option<bool>;
    fn bytes(&self, column: &str) -> Option<Vec<u8>>;
    fn json_text(&self, column: &str) -> Option<String>;
}

impl RowExt for RawRow {
    fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(value_to_int)
    }

    fn float(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(value_to_float)
    }

    fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(value_to_text)
    }

    fn flag(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(value_to_flag)
    }

    fn bytes(&self, column: &str) -> Option<Vec<u8>> {
        self.get(column).and_then(value_to_bytes)
    }

    fn json_text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(value_to_json_text)
    }
}

pub fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn value_to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_to_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "y" => Some(true),
            "false" | "no" | "0" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// JSON-ish text columns: newer exports inline the array, older ones a string
pub fn value_to_json_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        other => value_to_text(other),
    }
}

/// Blob cells: a byte array, a Node `Buffer` object, or a plain string.
///
/// Any other inline array (e.g. a list of URLs) is kept as its JSON text.
pub fn value_to_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_number) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        Value::Array(_) => Some(value.to_string().into_bytes()),
        Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some("Buffer") => {
            obj.get("data").and_then(value_to_bytes)
        }
        Value::String(s) if !s.is_empty() => Some(s.as_bytes().to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_int_from_mixed_encodings() {
        let r = row(json!({"a": 5, "b": "17", "c": " 42 ", "d": 3.0, "e": "abc", "f": null}));
        assert_eq!(r.int("a"), Some(5));
        assert_eq!(r.int("b"), Some(17));
        assert_eq!(r.int("c"), Some(42));
        assert_eq!(r.int("d"), Some(3));
        assert_eq!(r.int("e"), None);
        assert_eq!(r.int("f"), None);
        assert_eq!(r.int("missing"), None);
    }

    #[test]
    fn test_text_blank_is_none() {
        let r = row(json!({"a": "  ", "b": "x", "c": 12}));
        assert_eq!(r.text("a"), None);
        assert_eq!(r.text("b").as_deref(), Some("x"));
        assert_eq!(r.text("c").as_deref(), Some("12"));
    }

    #[test]
    fn test_flag_encodings() {
        let r = row(json!({"a": 1, "b": "no", "c": true, "d": "maybe"}));
        assert_eq!(r.flag("a"), Some(true));
        assert_eq!(r.flag("b"), Some(false));
        assert_eq!(r.flag("c"), Some(true));
        assert_eq!(r.flag("d"), None);
    }

    #[test]
    fn test_json_text_keeps_inline_arrays() {
        let r = row(json!({"a": ["x", "y"], "b": "[\"x\"]", "c": null}));
        assert_eq!(r.json_text("a").as_deref(), Some(r#"["x","y"]"#));
        assert_eq!(r.json_text("b").as_deref(), Some(r#"["x"]"#));
        assert_eq!(r.json_text("c"), None);
    }

    #[test]
    fn test_bytes_encodings() {
        let r = row(json!({
            "arr": [172, 237, 0, 5],
            "buf": {"type": "Buffer", "data": [104, 105]},
            "str": "hi",
            "bad": [1, 999]
        }));
        assert_eq!(r.bytes("arr"), Some(vec![0xAC, 0xED, 0x00, 0x05]));
        assert_eq!(r.bytes("buf"), Some(b"hi".to_vec()));
        assert_eq!(r.bytes("str"), Some(b"hi".to_vec()));
        assert_eq!(r.bytes("bad"), None);
    }

    #[test]
    fn test_bytes_from_inline_string_array() {
        let r = row(json!({"videos": ["https://a.test/v1", "https://a.test/v2"]}));
        let bytes = r.bytes("videos").unwrap();
        assert_eq!(
            crate::decode::decode_url_list(&bytes),
            Some(vec!["https://a.test/v1".to_string(), "https://a.test/v2".to_string()])
        );
    }
}
