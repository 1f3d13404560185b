//! Metadata value grammar.
//!
//! The right-hand side of a `key: value` record is one of:
//!
//! - empty
//! - a quoted string, `'…'` or `"…"`; the closing quote must end the value
//! - an array, `[` … `]`, with comma-separated items
//! - a boolean, exactly `true` or `false`
//! - anything else: a bare string, possibly several words

use prompt_syntax_lexer::{Range, Token, TokenKind, trim};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    String { text: String, quoted: bool },
    Boolean(bool),
    Array(Vec<HeaderValue>),
    Empty,
}

/// A parsed value together with its source text and range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderValue {
    pub kind: ValueKind,
    /// The value exactly as written.
    pub raw: String,
    pub range: Range,
}

impl HeaderValue {
    /// Name of the value's type as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ValueKind::String { .. } => "string",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::Array(_) => "array",
            ValueKind::Empty => "empty",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String { text, .. } => Some(text),
            _ => None,
        }
    }

    fn empty(range: Range) -> Self {
        Self {
            kind: ValueKind::Empty,
            raw: String::new(),
            range,
        }
    }
}

fn concat(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect()
}

fn span(tokens: &[Token<'_>]) -> Range {
    Range::new(tokens[0].range.start, tokens[tokens.len() - 1].range.end)
}

/// Parses the tokens after a record's colon.
///
/// `empty_range` is reported for a value with no tokens.
pub fn parse_value(tokens: &[Token<'_>], empty_range: Range) -> HeaderValue {
    let tokens = trim(tokens);
    if tokens.is_empty() {
        return HeaderValue::empty(empty_range);
    }

    let first = tokens[0].kind;
    let last = tokens[tokens.len() - 1].kind;
    if first == TokenKind::LBracket && last == TokenKind::RBracket && tokens.len() >= 2 {
        return parse_array(tokens);
    }

    parse_scalar(tokens)
}

fn parse_scalar(tokens: &[Token<'_>]) -> HeaderValue {
    let raw = concat(tokens);
    let range = span(tokens);

    if let Some(text) = quoted_text(tokens) {
        return HeaderValue {
            kind: ValueKind::String { text, quoted: true },
            raw,
            range,
        };
    }

    let kind = match raw.as_str() {
        "true" => ValueKind::Boolean(true),
        "false" => ValueKind::Boolean(false),
        _ => ValueKind::String {
            text: raw.clone(),
            quoted: false,
        },
    };

    HeaderValue { kind, raw, range }
}

/// Inner text of a properly quoted string, or `None`.
fn quoted_text(tokens: &[Token<'_>]) -> Option<String> {
    let quote = tokens[0].kind;
    if !quote.is_quote() || tokens.len() < 2 || tokens[tokens.len() - 1].kind != quote {
        return None;
    }

    let inner = &tokens[1..tokens.len() - 1];
    if inner.iter().any(|t| t.kind == quote) {
        return None;
    }
    Some(concat(inner))
}

fn parse_array(tokens: &[Token<'_>]) -> HeaderValue {
    let raw = concat(tokens);
    let range = span(tokens);
    let inner = &tokens[1..tokens.len() - 1];

    let mut items = Vec::new();
    if !trim(inner).is_empty() {
        let mut start = 0;
        let mut depth = 0usize;
        let mut quote: Option<TokenKind> = None;

        for (i, token) in inner.iter().enumerate() {
            match (quote, token.kind) {
                (Some(q), kind) if kind == q => quote = None,
                (Some(_), _) => {}
                (None, kind) if kind.is_quote() => quote = Some(kind),
                (None, TokenKind::LBracket) => depth += 1,
                (None, TokenKind::RBracket) => depth = depth.saturating_sub(1),
                (None, TokenKind::Comma) if depth == 0 => {
                    items.push(parse_value(&inner[start..i], token.range));
                    start = i + 1;
                }
                _ => {}
            }
        }

        let rest = &inner[start..];
        // `[a, b,]`: a trailing comma doesn't add an empty item
        if !trim(rest).is_empty() || items.is_empty() {
            let at = Range::empty(tokens[tokens.len() - 1].range.start);
            items.push(parse_value(rest, at));
        }
    }

    HeaderValue {
        kind: ValueKind::Array(items),
        raw,
        range,
    }
}
