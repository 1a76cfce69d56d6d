//! The built-in helpers: `if`, `unless`, `each`, `with` and the two
//! missing-helper hooks.

use super::{HelperResult, Invocation};
use crate::value::Value;

static NULL: Value = Value::Null;

fn first(params: &[Value]) -> &Value {
    params.first().unwrap_or(&NULL)
}

pub(crate) fn if_helper(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    let out = if first(params).is_truthy() {
        options.render_block(None, None)?
    } else {
        options.render_inverse(None, None)?
    };
    Ok(Value::String(out))
}

pub(crate) fn unless_helper(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    let out = if first(params).is_truthy() {
        options.render_inverse(None, None)?
    } else {
        options.render_block(None, None)?
    };
    Ok(Value::String(out))
}

/// Renders the block once per array element or object value
pub(crate) fn each_helper(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    let items: Vec<&Value> = match first(params) {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };
    if items.is_empty() {
        return options.render_inverse(None, None).map(Value::String);
    }
    let mut out = String::new();
    for item in items {
        out.push_str(&options.render_block(Some(item), None)?);
    }
    Ok(Value::String(out))
}

pub(crate) fn with_helper(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    let context = first(params);
    if context.is_null() {
        return options.render_inverse(None, None).map(Value::String);
    }
    options.render_block(Some(context), None).map(Value::String)
}

/// Default `helperMissing`: renders nothing
pub(crate) fn helper_missing(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    tracing::debug!(name = options.name(), params = params.len(), "missing helper");
    Ok(Value::Null)
}

/// Default `blockHelperMissing`: treats the value as a section.
///
/// A non-empty array renders the block per element, a truthy value renders it
/// once with the value as context, and anything else renders the inverse.
pub(crate) fn block_helper_missing(params: &[Value], options: &Invocation<'_>) -> HelperResult {
    let value = first(params);
    tracing::trace!(name = options.name(), "block section");
    let out = match value {
        Value::Array(items) if !items.is_empty() => {
            let mut out = String::new();
            for item in items {
                out.push_str(&options.render_block(Some(item), None)?);
            }
            out
        }
        value if value.is_truthy() => options.render_block(Some(value), None)?,
        _ => options.render_inverse(None, None)?,
    };
    Ok(Value::String(out))
}
