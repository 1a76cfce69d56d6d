use crate::compiler::Op;
use crate::error::Result;
use crate::render::{Renderer, Scope};
use crate::value::{Map, Value};

/// The bodies of a block call
#[derive(Clone, Copy)]
pub(crate) struct Bodies<'a> {
    pub program: &'a [Op],
    pub inverse: Option<&'a [Op]>,
}

/// Everything a helper knows about the tag that invoked it.
///
/// Block helpers render their bodies through [`Invocation::render_block`] and
/// [`Invocation::render_inverse`]; both return an empty string when called
/// from a non-block tag.
pub struct Invocation<'a> {
    pub(crate) name: &'a str,
    pub(crate) hash: Map,
    pub(crate) contexts: Vec<Value>,
    pub(crate) scope: &'a Scope<'a>,
    pub(crate) renderer: &'a Renderer<'a>,
    pub(crate) bodies: Option<Bodies<'a>>,
}

impl<'a> Invocation<'a> {
    /// The name written in the tag
    pub fn name(&self) -> &str {
        self.name
    }

    /// Resolved `key=value` arguments
    pub fn hash(&self) -> &Map {
        &self.hash
    }

    pub fn hash_get(&self, key: &str) -> Option<&Value> {
        self.hash.get(key)
    }

    /// In string-params mode, the scope that would have resolved each
    /// positional parameter; empty otherwise
    pub fn contexts(&self) -> &[Value] {
        &self.contexts
    }

    /// The current context, the helper's receiver
    pub fn this(&self) -> &Value {
        self.scope.this
    }

    /// The data frame, when the template tracks data
    pub fn data(&self) -> Option<&Map> {
        self.scope.data
    }

    pub fn is_block(&self) -> bool {
        self.bodies.is_some()
    }

    pub fn has_inverse(&self) -> bool {
        self.bodies.is_some_and(|b| b.inverse.is_some())
    }

    /// Renders the block's main program.
    ///
    /// `context` becomes the new `this` (the current one when `None`) and
    /// `data` replaces the inherited data frame for this render and everything
    /// nested in it.
    pub fn render_block(&self, context: Option<&Value>, data: Option<&Map>) -> Result<String> {
        match self.bodies {
            Some(bodies) => self.render_body(bodies.program, context, data),
            None => Ok(String::new()),
        }
    }

    /// Renders the block's inverse, or nothing if it has none
    pub fn render_inverse(&self, context: Option<&Value>, data: Option<&Map>) -> Result<String> {
        match self.bodies.and_then(|b| b.inverse) {
            Some(inverse) => self.render_body(inverse, context, data),
            None => Ok(String::new()),
        }
    }

    fn render_body(&self, ops: &[Op], context: Option<&Value>, data: Option<&Map>) -> Result<String> {
        let data = match data {
            Some(data) if self.renderer.tracks_data() => Some(data),
            _ => self.scope.data,
        };
        let scope = Scope {
            this: context.unwrap_or(self.scope.this),
            data,
            parent: Some(self.scope),
        };
        let mut out = String::new();
        self.renderer.render_ops(ops, &scope, &mut out)?;
        Ok(out)
    }
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("contexts", &self.contexts)
            .field("this", self.scope.this)
            .field("block", &self.is_block())
            .finish()
    }
}
