//! Normalization of list-typed stage results.
//!
//! The service is asked for a JSON array but language models do not always
//! comply. Accepted shapes, in order of preference:
//!
//! 1. A JSON array of strings
//! 2. A string containing a JSON array somewhere inside it
//! 3. Free text, one item per line, with `1.`, `-` or `*` prefixes removed

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static JSON_ARRAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array regex"));

#[allow(clippy::expect_used)]
static ITEM_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*|^[-*]\s*").expect("valid prefix regex"));

/// Turn a decoded `data` field into a list of non-empty items.
///
/// Returns `None` when the value is neither an array nor a string.
pub fn normalize_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(item_text).collect()),
        Value::String(text) => Some(parse_list_text(text)),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// Parse free-form model output into list items.
pub fn parse_list_text(text: &str) -> Vec<String> {
    if let Some(found) = JSON_ARRAY_REGEX.find(text) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(found.as_str()) {
            return items.iter().filter_map(item_text).collect();
        }
    }

    text.lines()
        .map(|line| ITEM_PREFIX_REGEX.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn item_text(item: &Value) -> Option<String> {
    let text = match item {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
