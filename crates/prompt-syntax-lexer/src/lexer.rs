//! # Lexer - Tokenizing Prompt Source
//!
//! This module breaks source text into tokens using the [Logos] lexer
//! generator and attaches a 1-based line/column [`Range`] to every token.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! **Every character in the input appears in exactly one token.** Characters
//! Logos cannot classify become [`TokenKind::Unknown`] instead of being
//! dropped, so positions downstream are never off by one:
//!
//! ```
//! use prompt_syntax_lexer::lex;
//!
//! let input = "---\ndescription: 'Hi'\n---\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are minimal and context-free. The lexer doesn't know whether `:`
//! separates a metadata key from its value or is part of a `#file:`
//! reference; that's the job of the header parser and reference scanner.
//! Runs of ordinary characters are grouped into a single [`TokenKind::Word`].
//!
//! ## Laziness
//!
//! [`Lexer`] is an iterator: tokens are produced on demand, strictly
//! left-to-right. It is `Clone`, and [`Lexer::reset`] restarts it from the
//! beginning of the source.

use logos::Logos;
use serde::{Deserialize, Serialize};

use crate::range::{Position, Range};

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// `:` separating metadata keys from values
    #[token(":")]
    Colon,

    /// `,` separating array items
    #[token(",")]
    Comma,

    /// `#` opening a `#file:` reference
    #[token("#")]
    Hash,

    /// `-` used by front matter fences
    #[token("-")]
    Dash,

    /// `[` for arrays and link labels
    #[token("[")]
    LBracket,

    /// `]` for arrays and link labels
    #[token("]")]
    RBracket,

    /// `(` for link targets
    #[token("(")]
    LParen,

    /// `)` for link targets
    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    /// `'` quoting string values
    #[token("'")]
    Quote,

    /// `"` quoting string values
    #[token("\"")]
    DoubleQuote,

    /// Backtick delimiting inline code and fences
    #[token("`")]
    Backtick,

    /// Plain text - any run not matched by other rules
    #[regex(r#"[^\s:,\[\](){}'"`#-]+"#)]
    Word,

    /// Anything Logos rejects (a lone `\r`, non-ASCII whitespace, ...)
    Unknown,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Newline)
    }

    pub fn is_quote(self) -> bool {
        matches!(self, TokenKind::Quote | TokenKind::DoubleQuote)
    }
}

/// A lexed token: its kind, the text slice it covers and its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: Range,
}

/// Lazy, restartable token stream over a source string.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            position: Position::start(),
        }
    }

    /// The text this lexer reads from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Rewinds to the first token.
    pub fn reset(&mut self) {
        *self = Self::new(self.source);
    }

    fn advance(&mut self, kind: TokenKind, text: &str) -> Position {
        let start = self.position;
        if kind == TokenKind::Newline {
            self.position = Position::new(start.line + 1, 1);
        } else {
            self.position.column += text.chars().count();
        }
        start
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let text = self.inner.slice();
        // Logos error means unrecognized character - keep it as Unknown
        let kind = result.unwrap_or(TokenKind::Unknown);
        let start = self.advance(kind, text);

        Some(Token {
            kind,
            text,
            range: Range::new(start, self.position),
        })
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Lex the whole input into a vector of tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
