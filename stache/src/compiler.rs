//! Static compilation of a parsed template.
//!
//! The compiler walks the AST once and lowers it to a flat list of ops per
//! program. Every tag that names something gets a [`Resolution`] decided from
//! the [`CompileOptions`]; nothing is evaluated here.

use std::str::FromStr;
use std::sync::Arc;

use stache_parser::ast::{self, Expr, Literal, Node, Path};
use stache_parser::{ParseError, parse};

use crate::options::CompileOptions;
use crate::value::Value;

/// How a tag's name is looked up at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Scoped, compound, or unknown under `known_helpers_only`: context only
    Property,
    /// A bare identifier declared as a known helper
    Known,
    /// A bare identifier with no arguments: helper first, then context
    Ambiguous,
    /// An identifier with arguments: always a helper call
    Helper,
}

#[derive(Debug, Clone)]
pub(crate) enum Param {
    Literal(Value),
    Path(Path),
    /// String-params mode: the path's text, plus the depth of the scope that
    /// would have resolved it
    Source { text: String, depth: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub name: String,
    pub path: Path,
    pub resolution: Resolution,
    pub params: Vec<Param>,
    pub hash: Vec<(String, Param)>,
}

#[derive(Debug, Clone)]
pub(crate) enum Op {
    Content(String),
    Literal { value: Value, escape: bool },
    Expression { call: Call, escape: bool },
    Block {
        call: Call,
        program: Vec<Op>,
        inverse: Option<Vec<Op>>,
    },
    Partial { name: String, context: Option<Param> },
}

/// A compiled template, ready to render any number of times.
///
/// ```rust
/// use stache::{CompileOptions, RuntimeOptions, Template};
/// use serde_json::json;
///
/// let template = Template::compile("Goodbye {{cruel}} {{world}}!", &CompileOptions::default()).unwrap();
/// let out = template
///     .render(&json!({"cruel": "cruel", "world": "world"}).into(), &RuntimeOptions::new())
///     .unwrap();
/// assert_eq!(out, "Goodbye cruel world!");
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) program: Arc<Vec<Op>>,
    pub(crate) options: CompileOptions,
}

impl Template {
    /// Parses and compiles `source`
    pub fn compile(source: &str, options: &CompileOptions) -> Result<Template, ParseError> {
        tracing::debug!(
            len = source.len(),
            known_helpers_only = options.known_helpers_only,
            string_params = options.string_params,
            data = options.data,
            "compiling template"
        );
        let ast = parse(source)?;
        let compiler = Compiler { options };
        let program = compiler.program(&ast);
        tracing::debug!(ops = program.len(), "compiled template");
        Ok(Template {
            program: Arc::new(program),
            options: options.clone(),
        })
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

struct Compiler<'a> {
    options: &'a CompileOptions,
}

pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Number(text) => serde_json::Number::from_str(text)
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(text.clone())),
    }
}

impl Compiler<'_> {
    fn program(&self, program: &ast::Program) -> Vec<Op> {
        let mut ops = Vec::with_capacity(program.nodes.len());
        for node in &program.nodes {
            match node {
                Node::Content(text) => match ops.last_mut() {
                    // adjacent text is left behind by dropped comments
                    Some(Op::Content(prev)) => prev.push_str(text),
                    _ => ops.push(Op::Content(text.clone())),
                },
                Node::Comment(_) => {}
                Node::Mustache { call, escaped } => ops.push(match &call.head {
                    Expr::Literal(literal) => Op::Literal {
                        value: literal_value(literal),
                        escape: *escaped,
                    },
                    Expr::Path(path) => Op::Expression {
                        call: self.call(path, call),
                        escape: *escaped,
                    },
                }),
                Node::Block {
                    call,
                    program,
                    inverse,
                } => {
                    // block heads are always paths
                    let Expr::Path(path) = &call.head else {
                        continue;
                    };
                    ops.push(Op::Block {
                        call: self.call(path, call),
                        program: self.program(program),
                        inverse: inverse.as_ref().map(|p| self.program(p)),
                    });
                }
                Node::Partial { name, context } => ops.push(Op::Partial {
                    name: name.clone(),
                    context: context.as_ref().map(|e| self.value_param(e)),
                }),
            }
        }
        ops
    }

    fn call(&self, path: &Path, call: &ast::Call) -> Call {
        let name = path.original.clone();
        let resolution = self.resolution(path, call.has_arguments());
        tracing::trace!(name = %name, ?resolution, "resolved call");
        Call {
            name,
            path: path.clone(),
            resolution,
            params: call.params.iter().map(|e| self.param(e)).collect(),
            hash: call
                .hash
                .iter()
                .map(|(k, v)| (k.clone(), self.value_param(v)))
                .collect(),
        }
    }

    fn resolution(&self, path: &Path, has_arguments: bool) -> Resolution {
        if !path.is_simple() {
            return Resolution::Property;
        }
        let known = self.options.is_known(&path.segments[0]);
        if self.options.known_helpers_only && !known {
            Resolution::Property
        } else if has_arguments {
            Resolution::Helper
        } else if known {
            Resolution::Known
        } else {
            Resolution::Ambiguous
        }
    }

    /// Positional parameter, honouring string-params mode
    fn param(&self, expr: &Expr) -> Param {
        match expr {
            Expr::Path(path) if self.options.string_params => Param::Source {
                text: path.string(),
                depth: path.depth,
            },
            other => self.value_param(other),
        }
    }

    fn value_param(&self, expr: &Expr) -> Param {
        match expr {
            Expr::Literal(literal) => Param::Literal(literal_value(literal)),
            Expr::Path(path) => Param::Path(path.clone()),
        }
    }
}
