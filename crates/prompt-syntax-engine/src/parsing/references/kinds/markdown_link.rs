use prompt_syntax_lexer::TokenKind;

/// `[label](<path>)` on a single line.
pub struct MarkdownLink;

impl MarkdownLink {
    pub const LABEL_OPEN: TokenKind = TokenKind::LBracket;
    pub const LABEL_CLOSE: TokenKind = TokenKind::RBracket;
    pub const TARGET_OPEN: TokenKind = TokenKind::LParen;
    pub const TARGET_CLOSE: TokenKind = TokenKind::RParen;
    /// Prefix turning a link into an image.
    pub const IMAGE: char = '!';

    /// Whether a link target names a document rather than a web address or
    /// an in-page anchor.
    pub fn is_document_target(target: &str) -> bool {
        !(target.starts_with('#') || target.contains("://") || target.starts_with("mailto:"))
    }
}
