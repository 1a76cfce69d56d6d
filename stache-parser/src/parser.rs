// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Template parsing
//!
//! Consumes the lexer's token stream and builds a [`Program`]. Blocks are kept on
//! an open stack until their close tag arrives; the close tag must repeat the
//! opening name exactly.
//!
//! # Examples
//!
//! ```rust
//! use stache_parser::{parse, ast::Node};
//!
//! let program = parse("{{#items}}{{.}}{{^}}none{{/items}}").unwrap();
//! assert!(matches!(program.nodes[0], Node::Block { inverse: Some(_), .. }));
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    ast::{Call, Expr, Literal, Node, Path, Program},
    error::{ParseError, ParseErrorKind, Result},
    lexer::{tokenize, Span, Token as LexToken, TokenKind},
    tokenizer::{Token, Tokens},
};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?$").expect("number pattern is valid"));

/// Parses a template source into an AST
pub fn parse(src: &str) -> Result<Program> {
    let program = Parser::new(src).parse()?;
    tracing::trace!(nodes = program.nodes.len(), "parsed template");
    Ok(program)
}

/// A block waiting for its close tag
struct OpenBlock {
    call: Call,
    name: String,
    /// Opened with `{{^name}}`
    inverted: bool,
    program: Vec<Node>,
    inverse: Option<Vec<Node>>,
    offset: usize,
}

struct Parser<'a> {
    src: &'a str,
    open_stack: Vec<OpenBlock>,
    root: Vec<Node>,
}

fn unescape(value: &str) -> String {
    value.replace("\\\"", "\"")
}

fn comment_text(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix("{{!--") {
        // `{{!--}}` shares its dashes between the open and close markers
        return rest.strip_suffix("--}}").unwrap_or_default();
    }
    raw.strip_prefix("{{!")
        .and_then(|s| s.strip_suffix("}}"))
        .unwrap_or(raw)
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            open_stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, self.src, offset)
    }

    /// The node list currently being appended to
    fn nodes(&mut self) -> &mut Vec<Node> {
        match self.open_stack.last_mut() {
            Some(open) => open.inverse.as_mut().unwrap_or(&mut open.program),
            None => &mut self.root,
        }
    }

    fn parse(mut self) -> Result<Program> {
        let mut tokens = tokenize(self.src)?.into_iter();
        while let Some(token) = tokens.next() {
            match token.kind {
                TokenKind::Text => {
                    let text = token.span.slice(self.src).to_string();
                    self.nodes().push(Node::Content(text));
                }
                TokenKind::Comment => {
                    let text = comment_text(token.span.slice(self.src)).to_string();
                    self.nodes().push(Node::Comment(text));
                }
                TokenKind::Body | TokenKind::Close | TokenKind::CloseUnescaped => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken(token.span.slice(self.src).to_string()),
                        token.span.start,
                    ));
                }
                _ => {
                    let body = match (tokens.next(), tokens.next()) {
                        (Some(body), Some(_close)) if body.kind == TokenKind::Body => body,
                        _ => return Err(ParseError::unterminated(self.src, token.span.start)),
                    };
                    self.tag(token, body.span)?;
                }
            }
        }
        if let Some(open) = self.open_stack.pop() {
            return Err(self.error(ParseErrorKind::UnclosedBlock(open.name), open.offset));
        }
        Ok(Program { nodes: self.root })
    }

    fn tag(&mut self, open: LexToken, body: Span) -> Result<()> {
        let text = body.slice(self.src).trim();
        match open.kind {
            TokenKind::Open if text == "else" => self.inverse(open.span.start),
            TokenKind::OpenInverse if text.is_empty() => self.inverse(open.span.start),
            TokenKind::OpenBlock | TokenKind::OpenInverse => self.open_block(open, body),
            TokenKind::OpenEndBlock => self.close_block(open, text),
            TokenKind::OpenPartial => self.partial(body),
            kind => {
                let call = self.call(body)?;
                self.nodes().push(Node::Mustache {
                    call,
                    escaped: kind == TokenKind::Open,
                });
                Ok(())
            }
        }
    }

    /// Splits the current block into program and inverse
    fn inverse(&mut self, offset: usize) -> Result<()> {
        match self.open_stack.last_mut() {
            Some(open) if open.inverse.is_none() => {
                open.inverse = Some(Vec::new());
                Ok(())
            }
            _ => Err(self.error(ParseErrorKind::MisplacedInverse, offset)),
        }
    }

    fn open_block(&mut self, open: LexToken, body: Span) -> Result<()> {
        let call = self.call(body)?;
        let name = match &call.head {
            Expr::Path(path) => path.original.clone(),
            Expr::Literal(_) => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedToken(body.slice(self.src).trim().to_string()),
                    body.start,
                ));
            }
        };
        self.open_stack.push(OpenBlock {
            call,
            name,
            inverted: open.kind == TokenKind::OpenInverse,
            program: Vec::new(),
            inverse: None,
            offset: open.span.start,
        });
        Ok(())
    }

    fn close_block(&mut self, close: LexToken, name: &str) -> Result<()> {
        let block = match self.open_stack.pop() {
            Some(block) => block,
            None => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedClose(name.to_string()),
                    close.span.start,
                ));
            }
        };
        if block.name != name {
            return Err(self.error(
                ParseErrorKind::BlockMismatch {
                    open: block.name,
                    close: name.to_string(),
                },
                close.span.start,
            ));
        }
        let (program, inverse) = if block.inverted {
            (block.inverse.unwrap_or_default(), Some(block.program))
        } else {
            (block.program, block.inverse)
        };
        self.nodes().push(Node::Block {
            call: block.call,
            program: Program { nodes: program },
            inverse: inverse.map(|nodes| Program { nodes }),
        });
        Ok(())
    }

    fn partial(&mut self, body: Span) -> Result<()> {
        let mut tokens = Tokens::new(self.src, body);
        let name = match tokens.next().transpose()? {
            Some(token) if token.key.is_none() => token.value.to_string(),
            Some(token) => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedToken(token.value.to_string()),
                    token.offset,
                ));
            }
            None => return Err(self.error(ParseErrorKind::EmptyTag, body.start)),
        };
        let context = match tokens.next().transpose()? {
            Some(token) if token.key.is_none() => Some(self.expr(&token)?),
            Some(token) => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedToken(token.value.to_string()),
                    token.offset,
                ));
            }
            None => None,
        };
        if let Some(extra) = tokens.next().transpose()? {
            return Err(self.error(
                ParseErrorKind::UnexpectedToken(extra.value.to_string()),
                extra.offset,
            ));
        }
        self.nodes().push(Node::Partial { name, context });
        Ok(())
    }

    fn call(&self, body: Span) -> Result<Call> {
        let mut tokens = Tokens::new(self.src, body);
        let head = match tokens.next().transpose()? {
            Some(token) if token.key.is_none() => self.expr(&token)?,
            Some(token) => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedToken(format!("{}=", token.key.unwrap_or_default())),
                    token.offset,
                ));
            }
            None => return Err(self.error(ParseErrorKind::EmptyTag, body.start)),
        };
        let mut params = Vec::new();
        let mut hash = BTreeMap::new();
        for token in tokens {
            let token = token?;
            match token.key {
                Some(key) => {
                    hash.insert(key.to_string(), self.expr(&token)?);
                }
                None if !hash.is_empty() => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken(token.value.to_string()),
                        token.offset,
                    ));
                }
                None => params.push(self.expr(&token)?),
            }
        }
        if matches!(head, Expr::Literal(_)) && (!params.is_empty() || !hash.is_empty()) {
            return Err(self.error(
                ParseErrorKind::UnexpectedToken(body.slice(self.src).trim().to_string()),
                body.start,
            ));
        }
        Ok(Call {
            head,
            params,
            hash,
            span: body,
        })
    }

    fn expr(&self, token: &Token<'_>) -> Result<Expr> {
        if token.quoted {
            return Ok(Expr::Literal(Literal::String(unescape(token.value))));
        }
        Ok(match token.value {
            "true" => Expr::Literal(Literal::Boolean(true)),
            "false" => Expr::Literal(Literal::Boolean(false)),
            value if NUMBER.is_match(value) => Expr::Literal(Literal::Number(value.to_string())),
            value => Expr::Path(self.path(value, token.offset)?),
        })
    }

    fn path(&self, raw: &str, offset: usize) -> Result<Path> {
        let invalid = || self.error(ParseErrorKind::InvalidPath(raw.to_string()), offset);
        let mut rest = raw;
        let mut depth = 0;
        loop {
            if let Some(tail) = rest.strip_prefix("../") {
                depth += 1;
                rest = tail;
            } else if rest == ".." {
                depth += 1;
                rest = "";
            } else {
                break;
            }
        }
        let mut is_this = false;
        if rest == "." || rest == "this" {
            is_this = true;
            rest = "";
        } else if let Some(tail) = ["./", "this/", "this."]
            .iter()
            .find_map(|prefix| rest.strip_prefix(prefix))
        {
            is_this = true;
            rest = tail;
        }
        let segments: Vec<String> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(['/', '.']).map(str::to_string).collect()
        };
        if segments.iter().any(|s| s.is_empty() || s == "this") {
            return Err(invalid());
        }
        if segments.is_empty() && depth == 0 && !is_this {
            return Err(invalid());
        }
        Ok(Path {
            original: raw.to_string(),
            depth,
            is_this,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(src: &str) -> Node {
        let mut program = parse(src).unwrap();
        assert_eq!(program.nodes.len(), 1, "{src}");
        program.nodes.remove(0)
    }

    fn call(src: &str) -> Call {
        match single(src) {
            Node::Mustache { call, .. } => call,
            node => panic!("expected mustache, got {node:?}"),
        }
    }

    fn head_path(src: &str) -> Path {
        match call(src).head {
            Expr::Path(path) => path,
            head => panic!("expected path, got {head:?}"),
        }
    }

    fn kind(src: &str) -> ParseErrorKind {
        parse(src).unwrap_err().kind
    }

    #[test]
    fn content_keeps_newlines_and_backslashes() {
        assert_eq!(
            parse("Goodbye\n{{cruel}}\\n").unwrap().nodes[2],
            Node::Content("\\n".to_string())
        );
    }

    #[test]
    fn escaped_flag() {
        for (src, escaped) in [("{{a}}", true), ("{{{a}}}", false), ("{{&a}}", false)] {
            assert!(matches!(single(src), Node::Mustache { escaped: e, .. } if e == escaped), "{src}");
        }
    }

    #[test]
    fn paths() {
        let path = head_path("{{../../a/b}}");
        assert_eq!((path.depth, path.is_this, path.segments), (2, false, vec!["a".into(), "b".into()]));

        let path = head_path("{{this.foo}}");
        assert!(path.is_this);
        assert_eq!(path.string(), "foo");

        let path = head_path("{{.}}");
        assert!(path.is_this && path.segments.is_empty());

        let path = head_path("{{is.a}}");
        assert!(!path.is_simple());
        assert_eq!(path.string(), "is.a");

        assert!(head_path("{{foo-bar}}").is_simple());
    }

    #[test]
    fn invalid_paths() {
        for src in ["{{a/../b}}", "{{a//b}}", "{{a/this}}", "{{foo.}}"] {
            assert!(matches!(kind(src), ParseErrorKind::InvalidPath(_)), "{src}");
        }
    }

    #[test]
    fn literals_and_hash() {
        let call = call(r#"{{goodbye "a \"b\"" 12 -1.5 true cruel="CRUEL" times=12 world=world}}"#);
        assert_eq!(
            call.params,
            vec![
                Expr::Literal(Literal::String("a \"b\"".into())),
                Expr::Literal(Literal::Number("12".into())),
                Expr::Literal(Literal::Number("-1.5".into())),
                Expr::Literal(Literal::Boolean(true)),
            ]
        );
        assert_eq!(call.hash["cruel"], Expr::Literal(Literal::String("CRUEL".into())));
        assert_eq!(call.hash["times"], Expr::Literal(Literal::Number("12".into())));
        assert!(matches!(&call.hash["world"], Expr::Path(p) if p.is_simple()));
    }

    #[test]
    fn malformed_literal() {
        assert_eq!(kind(r#"Message: {{hello wo"rld"}}"#), ParseErrorKind::MalformedLiteral);
    }

    #[test]
    fn param_after_hash() {
        assert!(matches!(kind("{{a b=1 c}}"), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn blocks() {
        match single("{{#people}}{{name}}{{^}}{{none}}{{/people}}") {
            Node::Block { call, program, inverse } => {
                assert!(matches!(call.head, Expr::Path(ref p) if p.original == "people"));
                assert_eq!(program.nodes.len(), 1);
                assert_eq!(inverse.unwrap().nodes.len(), 1);
            }
            node => panic!("expected block, got {node:?}"),
        }
    }

    #[test]
    fn else_marker() {
        assert!(matches!(
            single("{{#if a}}x{{else}}y{{/if}}"),
            Node::Block { inverse: Some(_), .. }
        ));
    }

    #[test]
    fn inverted_block() {
        match single("{{^goodbyes}}Right On!{{/goodbyes}}") {
            Node::Block { program, inverse, .. } => {
                assert!(program.nodes.is_empty());
                assert_eq!(inverse.unwrap().nodes, vec![Node::Content("Right On!".into())]);
            }
            node => panic!("expected block, got {node:?}"),
        }
    }

    #[test]
    fn block_errors() {
        assert_eq!(
            kind("{{#goodbyes}}x{{/hellos}}"),
            ParseErrorKind::BlockMismatch { open: "goodbyes".into(), close: "hellos".into() }
        );
        assert_eq!(kind("{{#a}}x"), ParseErrorKind::UnclosedBlock("a".into()));
        assert_eq!(kind("x{{/a}}"), ParseErrorKind::UnexpectedClose("a".into()));
        assert_eq!(kind("{{^}}"), ParseErrorKind::MisplacedInverse);
        assert_eq!(kind("{{#a}}{{^}}{{else}}{{/a}}"), ParseErrorKind::MisplacedInverse);
        assert_eq!(kind("{{#}}{{/}}"), ParseErrorKind::EmptyTag);
        assert!(matches!(kind(r#"{{#"a"}}{{/"a"}}"#), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn partials() {
        assert_eq!(
            single("{{> dude}}"),
            Node::Partial { name: "dude".into(), context: None }
        );
        match single("{{>dude dudes}}") {
            Node::Partial { name, context: Some(Expr::Path(path)) } => {
                assert_eq!(name, "dude");
                assert_eq!(path.original, "dudes");
            }
            node => panic!("expected partial, got {node:?}"),
        }
        assert_eq!(kind("{{>}}"), ParseErrorKind::EmptyTag);
        assert!(matches!(kind("{{> a b c}}"), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn comments() {
        assert_eq!(
            parse("{{! Goodbye}}{{!-- {{x}} --}}").unwrap().nodes,
            vec![Node::Comment(" Goodbye".into()), Node::Comment(" {{x}} ".into())]
        );
        assert_eq!(
            parse("{{!--}}x").unwrap().nodes,
            vec![Node::Comment(String::new()), Node::Content("x".into())]
        );
    }

    #[test]
    fn misplaced_hash_equals() {
        assert_eq!(kind("{{foo =bar}}"), ParseErrorKind::UnexpectedToken("=bar".into()));
        assert_eq!(kind("{{foo bar= baz}}"), ParseErrorKind::UnexpectedToken("bar=".into()));
    }

    #[test]
    fn error_excerpt() {
        let err = parse("Hello {{name").unwrap_err();
        assert_eq!(err.offset, 6);
        assert_eq!(err.to_string(), "unterminated tag near \"Hello {{name\"");
    }
}
