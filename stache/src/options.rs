//! Compile-time and render-time configuration

use std::collections::HashMap;

use serde::Deserialize;

use crate::helpers::{
    BLOCK_HELPER_MISSING, HELPER_MISSING, HelperRegistry, HelperResult, Invocation,
};
use crate::partials::{Partial, PartialRegistry};
use crate::value::{Map, Value};

const BUILTIN_HELPERS: [&str; 6] = ["if", "unless", "each", "with", HELPER_MISSING, BLOCK_HELPER_MISSING];

/// Options fixed when a template is compiled.
///
/// Deserializes from the camelCase form
/// `{ "knownHelpers": {..}, "knownHelpersOnly": true, "stringParams": false, "data": true }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Helper names guaranteed to be registered at render time. The built-ins
    /// are known unless set to `false` here.
    pub known_helpers: HashMap<String, bool>,
    /// Unknown identifiers compile to plain property lookups
    pub known_helpers_only: bool,
    /// Positional path parameters are passed as their source text
    pub string_params: bool,
    /// Track the data frame through nested renders
    pub data: bool,
}

impl CompileOptions {
    pub fn known_helper(mut self, name: impl Into<String>, known: bool) -> Self {
        self.known_helpers.insert(name.into(), known);
        self
    }

    pub fn known_helpers_only(mut self, enabled: bool) -> Self {
        self.known_helpers_only = enabled;
        self
    }

    pub fn string_params(mut self, enabled: bool) -> Self {
        self.string_params = enabled;
        self
    }

    pub fn data(mut self, enabled: bool) -> Self {
        self.data = enabled;
        self
    }

    pub fn is_known(&self, name: &str) -> bool {
        match self.known_helpers.get(name) {
            Some(known) => *known,
            None => BUILTIN_HELPERS.contains(&name),
        }
    }
}

/// Extension points supplied to each render call.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub helpers: HelperRegistry,
    pub partials: PartialRegistry,
    /// Root data frame, visible to helpers when the template tracks data
    pub data: Option<Map>,
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &Invocation<'_>) -> HelperResult + Send + Sync + 'static,
    {
        self.helpers.register(name, f);
        self
    }

    pub fn partial(mut self, name: impl Into<String>, partial: impl Into<Partial>) -> Self {
        self.partials.register(name, partial);
        self
    }

    pub fn data(mut self, data: Map) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_helpers(mut self, helpers: HelperRegistry) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn with_partials(mut self, partials: PartialRegistry) -> Self {
        self.partials = partials;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_known_by_default() {
        let options = CompileOptions::default();
        for name in ["if", "unless", "each", "with", "helperMissing", "blockHelperMissing"] {
            assert!(options.is_known(name), "{name}");
        }
        assert!(!options.is_known("hello"));
    }

    #[test]
    fn known_helpers_can_add_and_remove() {
        let options = CompileOptions::default()
            .known_helper("hello", true)
            .known_helper("if", false);
        assert!(options.is_known("hello"));
        assert!(!options.is_known("if"));
    }

    #[test]
    fn deserializes_camel_case() {
        let options: CompileOptions = serde_json::from_str(
            r#"{"knownHelpers": {"hello": true}, "knownHelpersOnly": true, "data": true}"#,
        )
        .unwrap();
        assert_eq!(
            options,
            CompileOptions::default()
                .known_helper("hello", true)
                .known_helpers_only(true)
                .data(true)
        );
        assert!(!options.string_params);
    }

    #[test]
    fn runtime_defaults_include_builtins() {
        let runtime = RuntimeOptions::new();
        assert!(runtime.helpers.contains("each"));
        assert!(runtime.data.is_none());
    }
}
