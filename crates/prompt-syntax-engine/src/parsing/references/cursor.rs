use prompt_syntax_lexer::{Token, TokenKind};

/// A cursor for token-by-token scanning of one line.
///
/// Cloning is cheap, so callers save a copy before a speculative match and
/// restore it when the match fails.
#[derive(Clone)]
pub struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    /// Index of the current token.
    pub i: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, i: 0 }
    }

    /// Returns true if every token was consumed.
    pub fn eof(&self) -> bool {
        self.i >= self.tokens.len()
    }

    /// Peeks at the current token without advancing.
    pub fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.i)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Checks the current token's kind.
    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// The token before the current one.
    pub fn prev(&self) -> Option<&'t Token<'a>> {
        self.i.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Advances by one token, returning the consumed token.
    pub fn bump(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.i)?;
        self.i += 1;
        Some(token)
    }

    /// Consumes tokens while `pred` holds and returns them.
    pub fn bump_while(&mut self, pred: impl Fn(&Token<'a>) -> bool) -> &'t [Token<'a>] {
        let start = self.i;
        while let Some(token) = self.peek() {
            if !pred(token) {
                break;
            }
            self.i += 1;
        }
        &self.tokens[start..self.i]
    }
}
