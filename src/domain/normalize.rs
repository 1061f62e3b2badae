//! Canonicalization of raw frontmatter values
//!
//! Frontmatter is user-edited YAML, so the status and completed fields show
//! up as strings, booleans, lists, or worse. Normalization maps each raw
//! value to a canonical form or to "uninterpretable" (`None`); it never
//! fails and never touches the file.

use serde_yaml::Value;

/// Normalizes a raw status value to a canonical lowercase token
///
/// Strings are trimmed and lowercased (empty after trimming means absent).
/// Booleans become the literal tokens `"true"` / `"false"`. Lists yield the
/// first entry that normalizes, scanning left to right. Everything else is
/// uninterpretable.
pub fn normalize_status(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let token = s.trim().to_lowercase();
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        }
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Sequence(entries) => entries.iter().find_map(normalize_status),
        _ => None,
    }
}

/// Normalizes a raw completed value to a boolean
///
/// Booleans pass through. Strings are trimmed and lowercased and must read
/// exactly `"true"` or `"false"`. Lists yield the first entry that
/// normalizes. Everything else is uninterpretable.
pub fn normalize_completed(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Sequence(entries) => entries.iter().find_map(normalize_completed),
        _ => None,
    }
}
