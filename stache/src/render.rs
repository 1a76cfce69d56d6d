//! Evaluation of compiled templates.
//!
//! Rendering is a recursive walk over the ops with an explicit environment:
//! the chain of context scopes (borrowed on the stack, one per block entered)
//! and the caller's [`RuntimeOptions`].

use serde::Serialize;

use crate::compiler::{Call, Op, Param, Resolution, Template};
use crate::error::{RenderError, Result};
use crate::escape::escape_value;
use crate::helpers::{self, Bodies, Helper, Invocation};
use crate::options::RuntimeOptions;
use crate::value::{Map, Value};

/// One entry of the context stack
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub this: &'a Value,
    pub data: Option<&'a Map>,
    pub parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// The context `depth` scopes up; `None` past the root
    pub fn frame(&self, depth: usize) -> Option<&'a Value> {
        if depth == 0 {
            return Some(self.this);
        }
        let mut scope = self.parent?;
        for _ in 1..depth {
            scope = scope.parent?;
        }
        Some(scope.this)
    }
}

pub(crate) struct Renderer<'a> {
    template: &'a Template,
    runtime: &'a RuntimeOptions,
}

impl Template {
    /// Renders the template against `context`
    pub fn render(&self, context: &Value, runtime: &RuntimeOptions) -> Result<String> {
        self.render_scoped(context, runtime, runtime.data.as_ref())
    }

    /// Renders any serializable context
    pub fn render_serialize<T: Serialize + ?Sized>(&self, context: &T, runtime: &RuntimeOptions) -> Result<String> {
        let context = Value::from_serialize(context)?;
        self.render(&context, runtime)
    }

    pub(crate) fn render_scoped(&self, context: &Value, runtime: &RuntimeOptions, data: Option<&Map>) -> Result<String> {
        let renderer = Renderer {
            template: self,
            runtime,
        };
        let scope = Scope {
            this: context,
            data: if self.options.data { data } else { None },
            parent: None,
        };
        let mut out = String::new();
        renderer.render_ops(&self.program, &scope, &mut out)?;
        Ok(out)
    }
}

/// Property lookup: up `depth` scopes, then down the segments
fn lookup<'s>(path: &stache_parser::ast::Path, scope: &Scope<'s>) -> Option<&'s Value> {
    let mut value = scope.frame(path.depth)?;
    for segment in &path.segments {
        value = value.get(segment)?;
    }
    Some(value)
}

/// What a call's name turned out to be
enum Target<'s> {
    Helper(Helper),
    Value(Option<&'s Value>),
}

impl<'a> Renderer<'a> {
    pub(crate) fn tracks_data(&self) -> bool {
        self.template.options.data
    }

    pub(crate) fn render_ops(&self, ops: &[Op], scope: &Scope<'_>, out: &mut String) -> Result<()> {
        for op in ops {
            match op {
                Op::Content(text) => out.push_str(text),
                Op::Literal { value, escape } => self.write(value, *escape, out),
                Op::Expression { call, escape } => {
                    let value = self.expression(call, scope)?;
                    self.write(&value, *escape, out);
                }
                Op::Block {
                    call,
                    program,
                    inverse,
                } => {
                    let bodies = Bodies {
                        program,
                        inverse: inverse.as_deref(),
                    };
                    let value = self.block(call, scope, bodies)?;
                    out.push_str(&value.render());
                }
                Op::Partial { name, context } => self.partial(name, context.as_ref(), scope, out)?,
            }
        }
        Ok(())
    }

    fn write(&self, value: &Value, escape: bool, out: &mut String) {
        if escape {
            out.push_str(&escape_value(value));
        } else {
            out.push_str(&value.render());
        }
    }

    fn target<'s>(&self, call: &Call, scope: &Scope<'s>) -> Target<'s> {
        let registered = match call.resolution {
            Resolution::Property => None,
            Resolution::Known | Resolution::Ambiguous | Resolution::Helper => {
                self.runtime.helpers.get(&call.name)
            }
        };
        if let Some(helper) = registered {
            tracing::trace!(name = %call.name, "calling registered helper");
            return Target::Helper(helper.clone());
        }
        match lookup(&call.path, scope) {
            Some(Value::Function(f)) => Target::Helper(f.clone()),
            value => Target::Value(value),
        }
    }

    fn expression(&self, call: &Call, scope: &Scope<'_>) -> Result<Value> {
        match self.target(call, scope) {
            Target::Helper(helper) => self.invoke(&helper, call, scope, None),
            Target::Value(value) => match (call.resolution, value) {
                (Resolution::Helper, _) | (Resolution::Known | Resolution::Ambiguous, None) => {
                    let missing = helpers::helper_missing(&self.runtime.helpers);
                    self.invoke(&missing, call, scope, None)
                }
                (_, value) => Ok(value.cloned().unwrap_or_default()),
            },
        }
    }

    fn block(&self, call: &Call, scope: &Scope<'_>, bodies: Bodies<'_>) -> Result<Value> {
        match self.target(call, scope) {
            Target::Helper(helper) => self.invoke(&helper, call, scope, Some(bodies)),
            Target::Value(_) if call.resolution == Resolution::Helper => {
                let missing = helpers::helper_missing(&self.runtime.helpers);
                self.invoke(&missing, call, scope, Some(bodies))
            }
            Target::Value(value) => {
                let params = [value.cloned().unwrap_or_default()];
                let invocation = self.invocation(call, scope, Some(bodies), Vec::new());
                if self.template.options.known_helpers_only {
                    helpers::render_section(&params, &invocation)
                } else {
                    helpers::block_helper_missing(&self.runtime.helpers).call(&params, &invocation)
                }
            }
        }
    }

    fn invoke(&self, helper: &Helper, call: &Call, scope: &Scope<'_>, bodies: Option<Bodies<'_>>) -> Result<Value> {
        let mut params = Vec::with_capacity(call.params.len());
        let mut contexts = Vec::new();
        for param in &call.params {
            match param {
                Param::Source { text, depth } => {
                    params.push(Value::String(text.clone()));
                    contexts.push(scope.frame(*depth).cloned().unwrap_or_default());
                }
                other => {
                    params.push(self.resolve(other, scope));
                    if self.template.options.string_params {
                        contexts.push(scope.this.clone());
                    }
                }
            }
        }
        let invocation = self.invocation(call, scope, bodies, contexts);
        helper.call(&params, &invocation)
    }

    fn invocation<'i>(
        &'i self,
        call: &'i Call,
        scope: &'i Scope<'i>,
        bodies: Option<Bodies<'i>>,
        contexts: Vec<Value>,
    ) -> Invocation<'i> {
        let hash = call
            .hash
            .iter()
            .map(|(key, param)| (key.clone(), self.resolve(param, scope)))
            .collect();
        Invocation {
            name: &call.name,
            hash,
            contexts,
            scope,
            renderer: self,
            bodies,
        }
    }

    fn resolve(&self, param: &Param, scope: &Scope<'_>) -> Value {
        match param {
            Param::Literal(value) => value.clone(),
            Param::Path(path) => lookup(path, scope).cloned().unwrap_or_default(),
            Param::Source { text, .. } => Value::String(text.clone()),
        }
    }

    fn partial(&self, name: &str, context: Option<&Param>, scope: &Scope<'_>, out: &mut String) -> Result<()> {
        let Some(partial) = self.runtime.partials.get(name) else {
            return Err(RenderError::PartialNotFound {
                name: name.to_string(),
            });
        };
        let resolved;
        let context = match context {
            Some(param) => {
                resolved = self.resolve(param, scope);
                &resolved
            }
            None => scope.this,
        };
        let text = partial.render(context, self.runtime, scope.data, self.tracks_data())?;
        out.push_str(&text);
        Ok(())
    }
}
