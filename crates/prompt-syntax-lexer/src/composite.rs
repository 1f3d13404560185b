//! Composite tokens and line grouping.
//!
//! A [`Composite`] exclusively owns an ordered, non-empty run of child tokens
//! and reports the range spanning its first to its last child. Higher layers
//! build their syntax (metadata records, file references, markdown links)
//! out of composites so ranges always come straight from the lexer.

use crate::lexer::{Token, TokenKind};
use crate::range::{Position, Range};

/// An ordered, non-empty sequence of tokens treated as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Composite<'a> {
    /// Wraps `tokens`, or returns `None` when there are none.
    pub fn new(tokens: Vec<Token<'a>>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    pub fn from_slice(tokens: &[Token<'a>]) -> Option<Self> {
        Self::new(tokens.to_vec())
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token<'a>> {
        self.tokens
    }

    pub fn first(&self) -> &Token<'a> {
        &self.tokens[0]
    }

    pub fn last(&self) -> &Token<'a> {
        &self.tokens[self.tokens.len() - 1]
    }

    /// Range from the start of the first child to the end of the last.
    pub fn range(&self) -> Range {
        Range::new(self.first().range.start, self.last().range.end)
    }

    /// Concatenated text of all children.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text).collect()
    }
}

/// One source line: its tokens without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Line<'a> {
    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Range of the line's content; empty lines get a zero-width range at
    /// column 1.
    pub fn range(&self) -> Range {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => Range::new(first.range.start, last.range.end),
            _ => Range::empty(Position::new(self.number, 1)),
        }
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text).collect()
    }

    /// True when the line has nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| t.kind == TokenKind::Whitespace)
    }

    /// The line's tokens with leading and trailing whitespace removed.
    pub fn trimmed(&self) -> &[Token<'a>] {
        trim(&self.tokens)
    }

    pub fn as_composite(&self) -> Option<Composite<'a>> {
        Composite::from_slice(&self.tokens)
    }
}

/// Strips leading and trailing whitespace tokens from a token slice.
pub fn trim<'s, 'a>(tokens: &'s [Token<'a>]) -> &'s [Token<'a>] {
    let start = tokens
        .iter()
        .position(|t| t.kind != TokenKind::Whitespace)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| t.kind != TokenKind::Whitespace)
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

/// Groups a token stream into lines.
///
/// The input `"a\n"` yields two lines: `a` and an empty line 2, mirroring
/// how editors count lines.
pub fn lines<'a>(tokens: impl IntoIterator<Item = Token<'a>>) -> Vec<Line<'a>> {
    let mut out = Vec::new();
    let mut current = Line {
        number: 1,
        tokens: Vec::new(),
    };

    for token in tokens {
        if token.kind == TokenKind::Newline {
            let number = current.number + 1;
            out.push(std::mem::replace(
                &mut current,
                Line {
                    number,
                    tokens: Vec::new(),
                },
            ));
        } else {
            current.tokens.push(token);
        }
    }

    out.push(current);
    out
}
