//! # prompt-syntax-lexer
//!
//! The tokenizer/codec layer for prompt files, built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens (with ranges) → Lines / Composites
//!               (Logos)
//! ```
//!
//! - [`lexer`]: lazy, lossless token stream. Every token carries a 1-based,
//!   end-exclusive line/column [`Range`].
//! - [`composite`]: tokens grouped into [`Line`]s and [`Composite`] tokens
//!   whose range spans their children.
//! - [`range`]: [`Position`] and [`Range`].
//!
//! ## Quick Start
//!
//! ```
//! use prompt_syntax_lexer::{Range, lex, lines};
//!
//! let lines = lines(lex("---\nmode: agent\n---\n"));
//! assert_eq!(lines[1].text(), "mode: agent");
//! assert_eq!(lines[1].range(), Range::from_coords(2, 1, 2, 12));
//! ```

pub mod composite;
pub mod lexer;
pub mod range;

pub use composite::{Composite, Line, lines, trim};
pub use lexer::{Lexer, Token, TokenKind, lex};
pub use range::{Position, Range};
