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

//! Error handling for the template parser
//!
//! Every failure records the byte offset where it was detected together with a
//! short excerpt of the surrounding source, so messages read like
//! `unterminated tag near "Hello {{name"`.

use thiserror::Error;

/// The reason a template failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A `{{` without its closing delimiter
    #[error("unterminated tag")]
    UnterminatedTag,
    /// `{{/close}}` does not name the innermost open block
    #[error("block `{open}` closed by `{close}`")]
    BlockMismatch { open: String, close: String },
    /// End of input reached while a block was still open
    #[error("unclosed block `{0}`")]
    UnclosedBlock(String),
    /// `{{/name}}` with no open block
    #[error("unexpected close `{0}`")]
    UnexpectedClose(String),
    /// `{{^}}` or `{{else}}` outside a block, or twice in the same block
    #[error("inverse marker not expected here")]
    MisplacedInverse,
    /// Stray or unterminated quote
    #[error("malformed literal")]
    MalformedLiteral,
    #[error("invalid path `{0}`")]
    InvalidPath(String),
    /// A literal where a name is required, or a parameter after the hash
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),
    #[error("empty tag")]
    EmptyTag,
}

/// Error type for template parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} near \"{near}\"")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the template source
    pub offset: usize,
    pub near: String,
}

/// Returns the last 32 bytes of a string for error context
pub(crate) fn rcap(src: &str) -> &str {
    static CAP_AT: usize = 32;

    if src.len() > CAP_AT {
        &src[floor_boundary(src, src.len() - CAP_AT)..]
    } else {
        src
    }
}

fn floor_boundary(src: &str, mut at: usize) -> usize {
    while !src.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn ceil_boundary(src: &str, mut at: usize) -> usize {
    while at < src.len() && !src.is_char_boundary(at) {
        at += 1;
    }
    at
}

impl ParseError {
    /// Creates a new parse error, capturing up to 16 bytes either side of `offset`
    pub(crate) fn new(kind: ParseErrorKind, src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let start = floor_boundary(src, offset.saturating_sub(16));
        let end = ceil_boundary(src, (offset + 16).min(src.len()));
        Self {
            kind,
            offset,
            near: src[start..end].to_string(),
        }
    }

    /// Creates an error for a tag left open at the end of input
    pub(crate) fn unterminated(src: &str, offset: usize) -> Self {
        let end = ceil_boundary(src, (offset + 32).min(src.len()));
        Self {
            kind: ParseErrorKind::UnterminatedTag,
            offset,
            near: rcap(&src[..end]).to_string(),
        }
    }
}

/// Result type for template parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_respects_char_boundaries() {
        let src = "ééééééééééééééééé{{x";
        let err = ParseError::new(ParseErrorKind::UnterminatedTag, src, 17);
        assert!(err.near.starts_with('é'));
        assert_eq!(err.to_string(), format!("unterminated tag near \"{}\"", err.near));
    }

    #[test]
    fn rcap_keeps_tail() {
        let src = "a".repeat(40);
        assert_eq!(rcap(&src).len(), 32);
        assert_eq!(rcap("short"), "short");
    }
}
