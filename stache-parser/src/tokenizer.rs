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

//! Tag body tokenization
//!
//! Breaks the body of a tag into whitespace separated words:
//!
//! - Bare words: `name`, `../parent/name`, `12`, `true`
//! - Quoted strings: `"Alan's \"world\""`
//! - Hash pairs: `times=12`, `cruel="CRUEL"`
//!
//! Quotes are only legal as the delimiters of a whole word; `wo"rld"` is a
//! [`ParseErrorKind::MalformedLiteral`].

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::lexer::{quoted_len, Span};

/// A word parsed from a tag body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Key of a `key=value` pair
    pub key: Option<&'a str>,
    /// The word, or the raw text between the quotes of a quoted string
    pub value: &'a str,
    pub quoted: bool,
    /// Byte offset of the word in the template source
    pub offset: usize,
}

/// Iterator over the words of a tag body
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
    end: usize,
}

fn is_space(c: char) -> bool {
    c.is_whitespace()
}

impl<'a> Tokens<'a> {
    /// Tokenizes `span` of the template `src`
    pub fn new(src: &'a str, span: Span) -> Self {
        Self {
            src,
            pos: span.start,
            end: span.end,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..self.end]
    }

    fn malformed(&self, at: usize) -> ParseError {
        ParseError::new(ParseErrorKind::MalformedLiteral, self.src, at)
    }

    fn unexpected(&self, token: String, at: usize) -> ParseError {
        ParseError::new(ParseErrorKind::UnexpectedToken(token), self.src, at)
    }

    /// Scans to the end of a bare word, stopping at whitespace, `=` or a quote
    fn word_end(&self) -> usize {
        self.rest()
            .char_indices()
            .find(|(_, c)| is_space(*c) || *c == '=' || *c == '"')
            .map(|(i, _)| self.pos + i)
            .unwrap_or(self.end)
    }

    fn word_end_at_space(&self) -> usize {
        self.rest()
            .char_indices()
            .find(|(_, c)| is_space(*c))
            .map(|(i, _)| self.pos + i)
            .unwrap_or(self.end)
    }

    fn quoted(&mut self, key: Option<&'a str>) -> Result<Token<'a>> {
        let start = self.pos;
        let len = quoted_len(self.rest()).ok_or_else(|| self.malformed(start))?;
        self.pos += len;
        if let Some(c) = self.rest().chars().next() {
            if !is_space(c) {
                return Err(self.malformed(self.pos));
            }
        }
        Ok(Token {
            key,
            value: &self.src[start + 1..start + len - 1],
            quoted: true,
            offset: start,
        })
    }

    fn bare(&mut self, key: Option<&'a str>) -> Result<Token<'a>> {
        let start = self.pos;
        let end = self.word_end_at_space();
        let value = &self.src[start..end];
        if let Some(quote) = value.find('"') {
            return Err(self.malformed(start + quote));
        }
        if value.is_empty() {
            let key = key.unwrap_or_default();
            return Err(self.unexpected(format!("{key}="), start));
        }
        if value.starts_with('=') {
            return Err(self.unexpected(value.to_string(), start));
        }
        self.pos = end;
        Ok(Token {
            key,
            value,
            quoted: false,
            offset: start,
        })
    }

    fn parse(&mut self) -> Result<Option<Token<'a>>> {
        let skip = self.rest().len() - self.rest().trim_start().len();
        self.pos += skip;
        if self.pos >= self.end {
            return Ok(None);
        }
        if self.rest().starts_with('"') {
            return self.quoted(None).map(Some);
        }
        let word_end = self.word_end();
        match self.src[word_end..self.end].chars().next() {
            Some('=') if word_end > self.pos => {
                let key = &self.src[self.pos..word_end];
                self.pos = word_end + 1;
                if self.rest().starts_with('"') {
                    self.quoted(Some(key)).map(Some)
                } else {
                    self.bare(Some(key)).map(Some)
                }
            }
            Some('=') => {
                let word = &self.src[self.pos..self.word_end_at_space()];
                Err(self.unexpected(word.to_string(), self.pos))
            }
            Some('"') => Err(self.malformed(word_end)),
            _ => self.bare(None).map(Some),
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.parse() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(err) => {
                self.pos = self.end;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(body: &str) -> Result<Vec<(Option<&str>, &str, bool)>> {
        Tokens::new(body, Span::new(0, body.len()))
            .map(|t| t.map(|t| (t.key, t.value, t.quoted)))
            .collect()
    }

    #[test]
    fn bare_words() {
        assert_eq!(
            words(" hello ../name  12 true ").unwrap(),
            [
                (None, "hello", false),
                (None, "../name", false),
                (None, "12", false),
                (None, "true", false),
            ]
        );
    }

    #[test]
    fn quoted_words() {
        assert_eq!(
            words(r#"hello "Alan's world" "\"world\"""#).unwrap(),
            [
                (None, "hello", false),
                (None, "Alan's world", true),
                (None, r#"\"world\""#, true),
            ]
        );
    }

    #[test]
    fn pairs() {
        assert_eq!(
            words(r#"goodbye cruel="CRUEL WORLD" times=12 print=true"#).unwrap(),
            [
                (None, "goodbye", false),
                (Some("cruel"), "CRUEL WORLD", true),
                (Some("times"), "12", false),
                (Some("print"), "true", false),
            ]
        );
    }

    #[test]
    fn stray_quotes() {
        for body in [r#"hello wo"rld""#, r#"hello "world"s"#, r#"hello "world"#, r#"a=b"c"#] {
            let err = words(body).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MalformedLiteral, "{body}");
        }
    }

    #[test]
    fn misplaced_equals() {
        for (body, token) in [("foo =bar", "=bar"), ("foo bar= baz", "bar="), ("foo bar=", "bar="), ("foo a==b", "=b")] {
            let err = words(body).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::UnexpectedToken(token.to_string()), "{body}");
        }
    }

    #[test]
    fn offsets_are_absolute() {
        let src = "{{a bc}}";
        let offsets: Vec<_> = Tokens::new(src, Span::new(2, 6))
            .map(|t| t.unwrap().offset)
            .collect();
        assert_eq!(offsets, [2, 4]);
    }
}
