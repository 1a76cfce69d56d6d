//! Abstract syntax tree for parsed templates
//!
//! The tree is immutable once [`crate::parse`] returns it. Paths keep their parent
//! depth unresolved; it is applied against the live context stack at render time.

use std::collections::BTreeMap;

use crate::lexer::Span;

/// A path into the context stack: `name`, `a/b`, `a.b`, `../name`, `this/x`, `.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Source text as written
    pub original: String,
    /// Number of leading `../`
    pub depth: usize,
    /// Explicit `this` or `.` prefix
    pub is_this: bool,
    pub segments: Vec<String>,
}

impl Path {
    /// A single identifier with no scoping, the only form that may name a helper
    pub fn is_simple(&self) -> bool {
        self.depth == 0 && !self.is_this && self.segments.len() == 1
    }

    /// The segments joined with `.`, parent markers and `this` stripped
    pub fn string(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Unescaped string contents
    String(String),
    /// Decimal number as written
    Number(String),
    Boolean(bool),
}

/// A parameter, hash value or expression head
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    Path(Path),
}

/// The inside of a mustache or block tag: `name param1 param2 key=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub head: Expr,
    pub params: Vec<Expr>,
    pub hash: BTreeMap<String, Expr>,
    pub span: Span,
}

impl Call {
    pub fn has_arguments(&self) -> bool {
        !self.params.is_empty() || !self.hash.is_empty()
    }
}

/// A sequence of nodes, the body of a template or block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Content(String),
    /// `{{call}}` when `escaped`, `{{{call}}}` or `{{&call}}` otherwise
    Mustache { call: Call, escaped: bool },
    /// `{{#call}}program{{^}}inverse{{/name}}`, or `{{^call}}inverse{{/name}}`
    /// with an empty program
    Block {
        call: Call,
        program: Program,
        inverse: Option<Program>,
    },
    /// `{{> name context}}`
    Partial { name: String, context: Option<Expr> },
    Comment(String),
}
