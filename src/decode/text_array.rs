//! JSON-ish text arrays
//!
//! Columns like `usp`, `images` and the RERA arrays are meant to hold a JSON
//! array of strings, but some legacy writers stored a bare unquoted string.

use serde_json::Value;

/// Normalize a JSON-ish array column into parseable JSON text.
///
/// If the first non-whitespace character is neither `[` nor `"`, the trimmed
/// text is quoted and wrapped as a single array element. Anything else passes
/// through trimmed, so normalizing twice is the same as normalizing once.
pub fn normalize_array_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    match trimmed.as_bytes().first()? {
        b'[' | b'"' => Some(trimmed.to_string()),
        _ => Some(format!("[{}]", Value::String(trimmed.to_string()))),
    }
}

/// Decode a JSON-ish array column into its elements, keeping positions.
///
/// Elements are not filtered: callers that zip parallel arrays rely on index
/// alignment. Null elements become empty strings and scalars are rendered as
/// text. Malformed text is `None`.
pub fn decode_string_array(text: &str) -> Option<Vec<String>> {
    let normalized = normalize_array_text(text)?;
    match serde_json::from_str::<Value>(&normalized).ok()? {
        Value::Array(items) => Some(items.into_iter().map(element_to_string).collect()),
        Value::String(s) => Some(vec![s]),
        _ => None,
    }
}

/// Like [`decode_string_array`] but trimmed, with blank entries dropped
pub fn decode_non_empty(text: Option<&str>) -> Vec<String> {
    text.and_then(decode_string_array)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn element_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_string_is_wrapped() {
        assert_eq!(
            normalize_array_text("  Phase 1 ").as_deref(),
            Some(r#"["Phase 1"]"#)
        );
        assert_eq!(decode_string_array("Phase 1"), Some(vec!["Phase 1".to_string()]));
    }

    #[test]
    fn test_bare_string_with_quotes_inside() {
        assert_eq!(
            decode_string_array(r#"Tower "A""#),
            Some(vec![r#"Tower "A""#.to_string()])
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [r#"["a","b"]"#, r#""a""#, "plain text", "  [1, 2] "] {
            let once = normalize_array_text(input).unwrap();
            let twice = normalize_array_text(&once).unwrap();
            assert_eq!(once, twice, "input: {}", input);
        }
    }

    #[test]
    fn test_valid_json_is_not_double_wrapped() {
        assert_eq!(
            decode_string_array(r#"["P1", "P2"]"#),
            Some(vec!["P1".to_string(), "P2".to_string()])
        );
        assert_eq!(decode_string_array(r#""P1""#), Some(vec!["P1".to_string()]));
    }

    #[test]
    fn test_positions_are_kept() {
        assert_eq!(
            decode_string_array(r#"["P-1", null, 42, ""]"#),
            Some(vec!["P-1".into(), "".into(), "42".into(), "".into()])
        );
    }

    #[test]
    fn test_malformed_and_blank() {
        assert_eq!(decode_string_array("[unterminated"), None);
        assert_eq!(decode_string_array("   "), None);
        // Only `[` and `"` count as already-JSON
        assert_eq!(
            decode_string_array(r#"{"a": 1}"#),
            Some(vec![r#"{"a": 1}"#.to_string()])
        );
    }

    #[test]
    fn test_decode_non_empty_drops_blanks() {
        assert_eq!(
            decode_non_empty(Some(r#"[" a ", "", null]"#)),
            vec!["a".to_string()]
        );
        assert!(decode_non_empty(None).is_empty());
    }
}
