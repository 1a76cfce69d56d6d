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

//! Template lexing
//!
//! Splits raw template text into a flat stream of tokens. Text outside tags is
//! passed through byte for byte: newlines and backslashes are never treated as
//! escapes.
//!
//! # Tag forms
//!
//! - Expressions: `{{name}}`, `{{{name}}}`, `{{&name}}`
//! - Blocks: `{{#name}}`, `{{^name}}`, `{{/name}}`
//! - Partials: `{{> name}}`
//! - Comments: `{{! comment }}` or `{{!-- may contain }} --}}`
//!
//! Each tag other than a comment becomes three tokens: the opening marker, the
//! body, and the closing marker.
//!
//! # Examples
//!
//! ```rust
//! use stache_parser::lexer::{tokenize, TokenKind};
//!
//! let tokens = tokenize("Hello {{name}}!").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(kinds, [TokenKind::Text, TokenKind::Open, TokenKind::Body, TokenKind::Close, TokenKind::Text]);
//! ```

use crate::error::{ParseError, Result};

/// A byte range into the template source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

/// Kinds of tokens produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text between tags
    Text,
    /// `{{`
    Open,
    /// `{{{`
    OpenUnescaped,
    /// `{{&`
    OpenAmpersand,
    /// `{{#`
    OpenBlock,
    /// `{{^`
    OpenInverse,
    /// `{{/`
    OpenEndBlock,
    /// `{{>`
    OpenPartial,
    /// The whole of a `{{! ... }}` tag
    Comment,
    /// Everything between an opening and closing marker
    Body,
    /// `}}`
    Close,
    /// `}}}`
    CloseUnescaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenizes a template source
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    Lexer::new(src).tokenize()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

/// Length of a double-quoted string starting at `src[0]`, including both quotes
pub(crate) fn quoted_len(src: &str) -> Option<usize> {
    let cliped = &src[1..];
    let mut escaped = false;
    for (i, c) in cliped.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '"' if !escaped => return Some(i + 2),
            _ => escaped = false,
        }
    }
    None
}

/// Finds `close` in a tag body, stepping over well formed quoted strings
fn find_close(body: &str, close: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if let Some(len) = quoted_len(&body[i..]) {
                i += len;
                continue;
            }
        }
        if bytes[i..].starts_with(close.as_bytes()) {
            return Some(i);
        }
        i += 1;
    }
    None
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        while self.pos < self.src.len() {
            match self.src[self.pos..].find("{{") {
                Some(offset) => {
                    if offset > 0 {
                        self.push(TokenKind::Text, self.pos, self.pos + offset);
                        self.pos += offset;
                    }
                    self.tag()?;
                }
                None => {
                    self.push(TokenKind::Text, self.pos, self.src.len());
                    self.pos = self.src.len();
                }
            }
        }
        Ok(self.tokens)
    }

    /// Lexes one tag starting at `self.pos`, which points at `{{`
    fn tag(&mut self) -> Result<()> {
        let start = self.pos;
        let marker = self.src[start + 2..].chars().next();
        let (open, close, close_kind) = match marker {
            Some('!') => return self.comment(start),
            Some('{') => (TokenKind::OpenUnescaped, "}}}", TokenKind::CloseUnescaped),
            Some('&') => (TokenKind::OpenAmpersand, "}}", TokenKind::Close),
            Some('#') => (TokenKind::OpenBlock, "}}", TokenKind::Close),
            Some('^') => (TokenKind::OpenInverse, "}}", TokenKind::Close),
            Some('/') => (TokenKind::OpenEndBlock, "}}", TokenKind::Close),
            Some('>') => (TokenKind::OpenPartial, "}}", TokenKind::Close),
            _ => (TokenKind::Open, "}}", TokenKind::Close),
        };
        let body = if open == TokenKind::Open { start + 2 } else { start + 3 };
        let end = body
            + find_close(&self.src[body..], close)
                .ok_or_else(|| ParseError::unterminated(self.src, start))?;
        self.push(open, start, body);
        self.push(TokenKind::Body, body, end);
        self.push(close_kind, end, end + close.len());
        self.pos = end + close.len();
        Ok(())
    }

    fn comment(&mut self, start: usize) -> Result<()> {
        let body = start + 3;
        // the opening `--` may double as the closing one: `{{!--}}`
        let close = if self.src[body..].starts_with("--") { "--}}" } else { "}}" };
        let end = body
            + self.src[body..]
                .find(close)
                .ok_or_else(|| ParseError::unterminated(self.src, start))?
            + close.len();
        self.push(TokenKind::Comment, start, end);
        self.pos = end;
        Ok(())
    }
}
