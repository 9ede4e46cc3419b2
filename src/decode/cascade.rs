//! Ordered fallback decoding of legacy blob fields
//!
//! Which encoding a blob uses depends on the legacy application version that
//! wrote it. A cascade tries each strategy in order and stops at the first one
//! that matches. Strategies are plain functions: same bytes in, same answer
//! out, and malformed input is a non-match, never an error.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde_json::Value;
use tracing::debug;

/// A decoding strategy. `None` means "did not match, try the next one".
pub type Strategy = fn(&[u8]) -> Option<Vec<String>>;

#[derive(Debug, Clone, Copy)]
pub struct NamedStrategy {
    pub name: &'static str,
    pub decode: Strategy,
}

/// Values produced by a cascade together with the strategy that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub values: Vec<String>,
    pub strategy: &'static str,
}

/// Java object serialization stream magic
const STREAM_MAGIC: [u8; 2] = [0xAC, 0xED];
/// Record marker preceding a length-prefixed string in that stream
const TC_STRING: u8 = 0x74;

// Runs of non-whitespace, non-angle-bracket, non-quote bytes after a URL prefix
static URL_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?-u)(?:https?://|www\.)[^\s<>"]+"#).unwrap()
});

/// Strategies for list-of-URL fields such as project videos, in cascade order
pub const URL_LIST_STRATEGIES: &[NamedStrategy] = &[
    NamedStrategy { name: "json_array", decode: json_string_array },
    NamedStrategy { name: "json_string", decode: json_string },
    NamedStrategy { name: "java_serialized", decode: java_serialized_string },
    NamedStrategy { name: "url_scan", decode: scan_urls },
    NamedStrategy { name: "printable_url_scan", decode: scan_printable_urls },
];

/// An ordered list of strategies
#[derive(Debug, Clone, Copy)]
pub struct Cascade {
    strategies: &'static [NamedStrategy],
}

impl Cascade {
    pub const fn new(strategies: &'static [NamedStrategy]) -> Self {
        Cascade { strategies }
    }

    pub fn strategies(&self) -> &'static [NamedStrategy] {
        self.strategies
    }

    /// Try every strategy in order. `None` when the input is blank or nothing matched.
    pub fn run(&self, bytes: &[u8]) -> Option<Decoded> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }

        let decoded = self.strategies.iter().find_map(|strategy| {
            (strategy.decode)(bytes).map(|values| Decoded {
                values,
                strategy: strategy.name,
            })
        });

        match &decoded {
            Some(d) => debug!(strategy = d.strategy, values = d.values.len(), "decoded blob field"),
            None => debug!(len = bytes.len(), "no strategy matched blob field"),
        }
        decoded
    }
}

pub static URL_LIST: Cascade = Cascade::new(URL_LIST_STRATEGIES);

/// Decode a list-of-URLs blob, `None` when it cannot be interpreted
pub fn decode_url_list(bytes: &[u8]) -> Option<Vec<String>> {
    URL_LIST.run(bytes).map(|decoded| decoded.values)
}

fn json_string_array(bytes: &[u8]) -> Option<Vec<String>> {
    let items: Vec<Value> = serde_json::from_slice(bytes).ok()?;
    let values: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!values.is_empty()).then_some(values)
}

fn json_string(bytes: &[u8]) -> Option<Vec<String>> {
    let value: String = serde_json::from_slice(bytes).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| vec![value.to_string()])
}

fn java_serialized_string(bytes: &[u8]) -> Option<Vec<String>> {
    if !bytes.starts_with(&STREAM_MAGIC) {
        return None;
    }

    let mut pos = STREAM_MAGIC.len();
    while pos < bytes.len() {
        if bytes[pos] == TC_STRING {
            if let Some(len) = bytes.get(pos + 1..pos + 3) {
                let len = u16::from_be_bytes([len[0], len[1]]) as usize;
                if let Some(payload) = bytes.get(pos + 3..pos + 3 + len) {
                    let value = String::from_utf8_lossy(payload).trim().to_string();
                    if !value.is_empty() {
                        return Some(vec![value]);
                    }
                }
            }
        }
        pos += 1;
    }
    None
}

fn scan_urls(bytes: &[u8]) -> Option<Vec<String>> {
    let urls: Vec<String> = URL_TOKEN
        .find_iter(bytes)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect();
    (!urls.is_empty()).then_some(urls)
}

fn scan_printable_urls(bytes: &[u8]) -> Option<Vec<String>> {
    let printable: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|b| (0x20..=0x7E).contains(b))
        .collect();
    scan_urls(&printable)
}
