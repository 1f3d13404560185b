//! # Front Matter Header
//!
//! A header is the block between a first line that is exactly `---` and the
//! next line that is exactly `---`. Without a closing fence there is no
//! header and the whole text is body.
//!
//! ## Modules
//!
//! - **`value`**: value grammar (strings, booleans, arrays, empty)
//! - **`rules`**: per-key validation producing [`Metadata`] and diagnostics
//!
//! Header parsing never fails: malformed input turns into diagnostics.

pub mod rules;
pub mod value;

use prompt_syntax_lexer::{Line, Range, Token, TokenKind};
use serde::Serialize;

use crate::models::{Diagnostic, DocumentType, Metadata};
use value::{HeaderValue, parse_value};

pub const FENCE: &str = "---";

/// One `key: value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRecord {
    pub key: String,
    pub key_range: Range,
    pub value: HeaderValue,
    /// The whole record, key through value.
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Fence to fence, or `None` when the document has no front matter.
    pub range: Option<Range>,
    pub records: Vec<HeaderRecord>,
    pub metadata: Metadata,
    pub diagnostics: Vec<Diagnostic>,
}

impl Header {
    /// The header of a document without front matter.
    pub fn absent(document_type: DocumentType) -> Self {
        Self {
            range: None,
            records: Vec::new(),
            metadata: Metadata::empty(document_type),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.range.is_some()
    }
}

/// Line indices of the opening and closing fences.
pub fn find_front_matter(lines: &[Line<'_>]) -> Option<(usize, usize)> {
    let first = lines.first()?;
    if first.text() != FENCE {
        return None;
    }
    let close = lines.iter().skip(1).position(|line| line.text() == FENCE)? + 1;
    Some((0, close))
}

/// Parses the header out of a document's lines.
///
/// Returns the header and the index of the first body line.
pub fn parse_header(document_type: DocumentType, lines: &[Line<'_>]) -> (Header, usize) {
    let Some((open, close)) = find_front_matter(lines) else {
        return (Header::absent(document_type), 0);
    };

    let mut records = Vec::new();
    let mut diagnostics = Vec::new();
    for line in &lines[open + 1..close] {
        match parse_record(line) {
            Some(Ok(record)) => records.push(record),
            Some(Err(diagnostic)) => diagnostics.push(diagnostic),
            None => {}
        }
    }

    let validated = rules::validate(document_type, &records);
    // every record sits on its own line, so a stable sort keeps record order
    diagnostics.extend(validated.diagnostics);
    diagnostics.sort_by_key(|d| d.range.start);
    diagnostics.extend(validated.mode_override);

    let header = Header {
        range: Some(lines[open].range().union(&lines[close].range())),
        records,
        metadata: validated.metadata,
        diagnostics,
    };
    (header, close + 1)
}

/// Parses one header line. Blank lines and `#` comments yield `None`.
fn parse_record(line: &Line<'_>) -> Option<Result<HeaderRecord, Diagnostic>> {
    let tokens = line.trimmed();
    let first = tokens.first()?;
    if first.kind == TokenKind::Hash {
        return None;
    }

    let range = Range::new(first.range.start, tokens[tokens.len() - 1].range.end);
    let invalid = || {
        Diagnostic::warning(
            range,
            format!("Invalid metadata record '{}'", line.text().trim()),
        )
    };

    let key_len = tokens
        .iter()
        .take_while(|t| matches!(t.kind, TokenKind::Word | TokenKind::Dash))
        .count();
    if key_len == 0 {
        return Some(Err(invalid()));
    }
    let key_tokens = &tokens[..key_len];

    let rest = skip_whitespace(&tokens[key_len..]);
    let Some((colon, value_tokens)) = rest.split_first() else {
        return Some(Err(invalid()));
    };
    if colon.kind != TokenKind::Colon {
        return Some(Err(invalid()));
    }

    let key_range = Range::new(
        key_tokens[0].range.start,
        key_tokens[key_len - 1].range.end,
    );

    Some(Ok(HeaderRecord {
        key: key_tokens.iter().map(|t| t.text).collect(),
        key_range,
        value: parse_value(value_tokens, range),
        range,
    }))
}

fn skip_whitespace<'s, 'a>(tokens: &'s [Token<'a>]) -> &'s [Token<'a>] {
    let start = tokens
        .iter()
        .position(|t| t.kind != TokenKind::Whitespace)
        .unwrap_or(tokens.len());
    &tokens[start..]
}
