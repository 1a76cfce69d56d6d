//! Helper registry and the helper calling convention.
//!
//! A helper is anything implementing [`HelperDef`]; closures with the
//! signature `Fn(&[Value], &Invocation<'_>) -> HelperResult` qualify.
//! Positional parameters arrive already resolved against the context, and
//! everything else about the call (hash, receiver, data frame, block bodies)
//! is on the [`Invocation`].

mod builtins;
mod invocation;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use invocation::Invocation;
pub(crate) use builtins::block_helper_missing as render_section;
pub(crate) use invocation::Bodies;

use crate::error::RenderError;
use crate::value::Value;

/// Called when a helper name is not registered and no callable property matches
pub const HELPER_MISSING: &str = "helperMissing";
/// Called for a block whose name is neither a helper nor a callable property
pub const BLOCK_HELPER_MISSING: &str = "blockHelperMissing";

pub type HelperResult = Result<Value, RenderError>;

pub trait HelperDef: Send + Sync {
    fn call(&self, params: &[Value], options: &Invocation<'_>) -> HelperResult;
}

impl<F> HelperDef for F
where
    F: Fn(&[Value], &Invocation<'_>) -> HelperResult + Send + Sync,
{
    fn call(&self, params: &[Value], options: &Invocation<'_>) -> HelperResult {
        self(params, options)
    }
}

pub type Helper = Arc<dyn HelperDef>;

/// Named helpers available to a render call
#[derive(Clone)]
pub struct HelperRegistry {
    helpers: HashMap<String, Helper>,
}

impl HelperRegistry {
    /// A registry holding the built-in helpers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("if", builtins::if_helper);
        registry.register("unless", builtins::unless_helper);
        registry.register("each", builtins::each_helper);
        registry.register("with", builtins::with_helper);
        registry.register(HELPER_MISSING, builtins::helper_missing);
        registry.register(BLOCK_HELPER_MISSING, builtins::block_helper_missing);
        registry
    }

    /// A registry with no helpers at all.
    ///
    /// The missing-helper hooks still fall back to their default behaviour.
    pub fn empty() -> Self {
        Self {
            helpers: HashMap::new(),
        }
    }

    /// Registers a closure or function, replacing any helper of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Value], &Invocation<'_>) -> HelperResult + Send + Sync + 'static,
    {
        self.register_helper(name, Arc::new(f))
    }

    pub fn register_helper(&mut self, name: impl Into<String>, helper: Helper) -> &mut Self {
        self.helpers.insert(name.into(), helper);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Helper> {
        self.helpers.remove(name)
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.helpers.keys().collect();
        names.sort();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}

/// The `helperMissing` hook: the registered one, else the default
pub(crate) fn helper_missing(registry: &HelperRegistry) -> Helper {
    match registry.get(HELPER_MISSING) {
        Some(helper) => helper.clone(),
        None => Arc::new(builtins::helper_missing),
    }
}

/// The `blockHelperMissing` hook: the registered one, else the default
pub(crate) fn block_helper_missing(registry: &HelperRegistry) -> Helper {
    match registry.get(BLOCK_HELPER_MISSING) {
        Some(helper) => helper.clone(),
        None => Arc::new(builtins::block_helper_missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_has_builtins() {
        let registry = HelperRegistry::new();
        for name in ["if", "unless", "each", "with", HELPER_MISSING, BLOCK_HELPER_MISSING] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(!HelperRegistry::empty().contains("if"));
    }

    #[test]
    fn register_replaces() {
        let mut registry = HelperRegistry::empty();
        registry.register("hello", |_, _| Ok(Value::from("one")));
        registry.register("hello", |_, _| Ok(Value::from("two")));
        assert!(registry.contains("hello"));
        assert!(registry.remove("hello").is_some());
        assert!(!registry.contains("hello"));
    }

    #[test]
    fn debug_lists_names() {
        let mut registry = HelperRegistry::empty();
        registry.register("b", |_, _| Ok(Value::Null));
        registry.register("a", |_, _| Ok(Value::Null));
        assert_eq!(format!("{registry:?}"), r#"HelperRegistry { helpers: ["a", "b"] }"#);
    }
}
