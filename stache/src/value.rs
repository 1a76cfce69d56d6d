//! Values rendered by templates.
//!
//! [`Value`] is the object graph a template walks. It mirrors JSON with two
//! additions: [`Value::Safe`], text already sanitized for output, and
//! [`Value::Function`], a callable that behaves like a helper when reached
//! through a property lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::helpers::{Helper, HelperResult, Invocation};

/// An object's members
pub type Map = BTreeMap<String, Value>;

/// A string exempt from HTML escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Safe(SafeString),
    Array(Vec<Value>),
    Object(Map),
    Function(Helper),
}

impl Value {
    /// Wraps a closure as a callable value
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value], &Invocation<'_>) -> HelperResult + Send + Sync + 'static,
    {
        Value::Function(Arc::new(f))
    }

    pub fn safe(text: impl Into<String>) -> Self {
        Value::Safe(SafeString::new(text))
    }

    /// Converts any serializable value
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Truthiness used by blocks and the built-in conditionals.
    ///
    /// Null, `false`, zero, the empty string and the empty array are falsy;
    /// everything else, including empty objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Safe(s) => !s.as_str().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Looks up a member: an object key, or an array index
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Safe(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Helper> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Stringifies the value without escaping.
    ///
    /// Arrays join their elements with `,` and objects print as
    /// `[object Object]`; null and functions print nothing.
    pub fn render(&self) -> String {
        match self {
            Value::Null | Value::Function(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => render_number(n),
            Value::String(s) => s.clone(),
            Value::Safe(s) => s.as_str().to_string(),
            Value::Array(items) => items.iter().map(Value::render).collect::<Vec<_>>().join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }
}

/// Whole floats print without a fraction: `1.0` renders as `1`
fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Safe(s) => f.debug_tuple("Safe").field(&s.as_str()).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(map) => f.debug_tuple("Object").field(map).finish(),
            Value::Function(_) => f.write_str("Function"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Safe(a), Value::Safe(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<SafeString> for Value {
    fn from(value: SafeString) -> Self {
        Value::Safe(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number((value as u64).into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(""), json!([])] {
            assert!(!Value::from(falsy.clone()).is_truthy(), "{falsy}");
        }
        for truthy in [json!(true), json!(1), json!("false"), json!(["foo"]), json!({})] {
            assert!(Value::from(truthy.clone()).is_truthy(), "{truthy}");
        }
        assert!(!Value::safe("").is_truthy());
        assert!(Value::function(|_, _| Ok(Value::Null)).is_truthy());
    }

    #[test]
    fn member_lookup() {
        let value = Value::from(json!({"alan": {"expression": "beautiful"}, "list": ["a", "b"]}));
        assert_eq!(
            value.get("alan").and_then(|v| v.get("expression")),
            Some(&Value::from("beautiful"))
        );
        assert_eq!(value.get("list").and_then(|v| v.get("1")), Some(&Value::from("b")));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::from("text").get("len"), None);
    }

    #[test]
    fn render_primitives() {
        assert_eq!(Value::from(json!(42)).render(), "42");
        assert_eq!(Value::from(json!(0)).render(), "0");
        assert_eq!(Value::from(json!(1.5)).render(), "1.5");
        assert_eq!(Value::from(json!(1.0)).render(), "1");
        assert_eq!(Value::from(json!(-0.0)).render(), "0");
        assert_eq!(Value::from(json!(-12.0)).render(), "-12");
        assert_eq!(Value::from(json!(false)).render(), "false");
        assert_eq!(Value::from(json!([1, "a", null])).render(), "1,a,");
        assert_eq!(Value::from(json!({"a": 1})).render(), "[object Object]");
        assert_eq!(Value::Null.render(), "");
    }

    #[derive(Serialize)]
    struct Person {
        name: &'static str,
        age: u32,
    }

    #[test]
    fn serialize() {
        let value = Value::from_serialize(&Person { name: "Alan", age: 3 }).unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("Alan"));
        assert_eq!(value.get("age").and_then(Value::as_i64), Some(3));
    }

    #[test]
    fn function_equality_is_identity() {
        let f = Value::function(|_, _| Ok(Value::Null));
        assert_eq!(f, f.clone());
        assert_ne!(f, Value::function(|_, _| Ok(Value::Null)));
    }
}
