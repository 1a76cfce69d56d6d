//! Template lexer and parser
//!
//! This crate provides the syntax half of `stache`: it turns mustache-style
//! template source into an immutable AST. It is shared by the `stache` runtime
//! and by the `stache-macros` crate, which uses it to reject broken templates at
//! build time.
//!
//! # Example
//!
//! ```rust
//! use stache_parser::{parse, ast::Node};
//!
//! let program = parse("Hello {{name}}!").unwrap();
//! assert_eq!(program.nodes.len(), 3);
//! assert!(matches!(program.nodes[1], Node::Mustache { escaped: true, .. }));
//! ```
//!
//! # Module Structure
//!
//! - `lexer.rs`: splits source into text and tag tokens
//! - `tokenizer.rs`: splits a tag body into words, strings and hash pairs
//! - `parser.rs`: builds the AST and validates block nesting
//! - `ast.rs`: the tree types
//! - `error.rs`: error types and handling

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tokenizer;

pub use error::{ParseError, ParseErrorKind, Result};
pub use parser::parse;
