use prompt_syntax_lexer::TokenKind;

/// `#file:<path>`, where the path runs to the next whitespace.
pub struct FileReference;

impl FileReference {
    pub const MARKER: TokenKind = TokenKind::Hash;
    pub const KEYWORD: &'static str = "file";
    pub const SEPARATOR: TokenKind = TokenKind::Colon;
}
