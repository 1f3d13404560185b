use prompt_syntax_lexer::TokenKind;

/// Code spans are raw zones: nothing inside them is a reference.
pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: TokenKind = TokenKind::Backtick;
}
