//! Named partial templates.
//!
//! A partial is registered as raw source, as an already compiled
//! [`Template`], or as a function from context to text. Source partials are
//! compiled on first use and the result is cached in the registry entry, so
//! clones of a registry share compiled partials.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use stache_parser::ParseError;

use crate::compiler::Template;
use crate::error::Result;
use crate::options::{CompileOptions, RuntimeOptions};
use crate::value::{Map, Value};

pub type PartialFn = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync>;

pub enum Partial {
    /// Compiled lazily; one cache slot per data-tracking mode of the caller
    Source {
        source: String,
        compiled: [OnceCell<Template>; 2],
    },
    Compiled(Template),
    Function(PartialFn),
}

impl Partial {
    pub fn source(source: impl Into<String>) -> Self {
        Partial::Source {
            source: source.into(),
            compiled: [OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        Partial::Function(Arc::new(f))
    }

    /// The compiled template, compiling source on first use.
    ///
    /// Returns `None` for function partials. A failed compile is not cached.
    pub fn template(&self, track_data: bool) -> Option<std::result::Result<&Template, ParseError>> {
        match self {
            Partial::Source { source, compiled } => Some(compile_cached(source, compiled, track_data)),
            Partial::Compiled(template) => Some(Ok(template)),
            Partial::Function(_) => None,
        }
    }

    /// Renders the partial in a fresh scope rooted at `context`
    pub(crate) fn render(
        &self,
        context: &Value,
        runtime: &RuntimeOptions,
        data: Option<&Map>,
        track_data: bool,
    ) -> Result<String> {
        match self {
            Partial::Source { source, compiled } => {
                compile_cached(source, compiled, track_data)?.render_scoped(context, runtime, data)
            }
            Partial::Compiled(template) => template.render_scoped(context, runtime, data),
            Partial::Function(f) => f(context),
        }
    }
}

fn compile_cached<'p>(
    source: &str,
    compiled: &'p [OnceCell<Template>; 2],
    track_data: bool,
) -> std::result::Result<&'p Template, ParseError> {
    compiled[usize::from(track_data)].get_or_try_init(|| {
        tracing::debug!(len = source.len(), track_data, "compiling partial");
        Template::compile(source, &CompileOptions::default().data(track_data))
    })
}

impl fmt::Debug for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partial::Source { source, .. } => f.debug_tuple("Source").field(source).finish(),
            Partial::Compiled(template) => f.debug_tuple("Compiled").field(template).finish(),
            Partial::Function(_) => f.write_str("Function"),
        }
    }
}

impl From<&str> for Partial {
    fn from(source: &str) -> Self {
        Partial::source(source)
    }
}

impl From<String> for Partial {
    fn from(source: String) -> Self {
        Partial::source(source)
    }
}

impl From<Template> for Partial {
    fn from(template: Template) -> Self {
        Partial::Compiled(template)
    }
}

/// Named partials available to a render call
#[derive(Clone, Default)]
pub struct PartialRegistry {
    partials: HashMap<String, Arc<Partial>>,
}

impl PartialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, partial: impl Into<Partial>) -> &mut Self {
        self.partials.insert(name.into(), Arc::new(partial.into()));
        self
    }

    pub fn register_source(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.register(name, Partial::source(source))
    }

    pub fn register_template(&mut self, name: impl Into<String>, template: Template) -> &mut Self {
        self.register(name, Partial::Compiled(template))
    }

    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        self.register(name, Partial::function(f))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Partial>> {
        self.partials.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partials.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.partials.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PartialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialRegistry")
            .field("partials", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_compiles_once() {
        let partial = Partial::source("{{name}}");
        let first = partial.template(false).unwrap().unwrap() as *const Template;
        let second = partial.template(false).unwrap().unwrap() as *const Template;
        assert_eq!(first, second);
        assert!(partial.template(true).unwrap().unwrap().options().data);
    }

    #[test]
    fn failed_compile_is_not_cached() {
        let partial = Partial::source("{{#open}}");
        assert!(partial.template(false).unwrap().is_err());
        assert!(partial.template(false).unwrap().is_err());
    }

    #[test]
    fn renders_each_kind() {
        let runtime = RuntimeOptions::new();
        let context = Value::from(serde_json::json!({"name": "Alan"}));
        let compiled = Template::compile("<{{name}}>", &CompileOptions::default()).unwrap();
        let function = Partial::function(|context| Ok(context.get("name").map(Value::render).unwrap_or_default()));
        for (partial, expected) in [
            (Partial::source("{{name}}!"), "Alan!"),
            (Partial::from(compiled), "<Alan>"),
            (function, "Alan"),
        ] {
            assert_eq!(partial.render(&context, &runtime, None, false).unwrap(), expected);
        }
    }

    #[test]
    fn function_partials_have_no_template() {
        let partial = Partial::function(|_| Ok(String::new()));
        assert!(partial.template(false).is_none());
    }

    #[test]
    fn clones_share_entries() {
        let mut registry = PartialRegistry::new();
        registry.register_source("dude", "{{name}}").register("other", "x");
        let clone = registry.clone();
        assert!(Arc::ptr_eq(&registry.partials["dude"], &clone.partials["dude"]));
        assert_eq!(clone.names(), vec!["dude", "other"]);
        assert_eq!(clone.len(), 2);
    }
}
