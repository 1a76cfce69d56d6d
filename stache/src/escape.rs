//! HTML escaping for double-brace output

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::Value;

static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new("[&<>\"'`]").unwrap());

/// Replaces the characters that are unsafe in HTML text and attribute values
pub fn escape(text: &str) -> String {
    UNSAFE
        .replace_all(text, |caps: &Captures| match &caps[0] {
            "&" => "&amp;",
            "<" => "&lt;",
            ">" => "&gt;",
            "\"" => "&quot;",
            "'" => "&#x27;",
            _ => "&#x60;",
        })
        .into_owned()
}

/// Output text for a double-brace tag.
///
/// Safe strings pass through untouched and null prints nothing; every other
/// value is stringified and then escaped.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Safe(s) => s.as_str().to_string(),
        Value::Null => String::new(),
        other => escape(&other.render()),
    }
}
