//! # Body References
//!
//! Finds `#file:<path>` and `[label](<path>)` references in body text and
//! turns their paths into URIs.
//!
//! ## Modules
//!
//! - **`cursor`**: token cursor used by the scanner
//! - **`kinds`**: delimiters owned by each construct
//! - **`scanner`**: line-by-line scan honouring raw zones

pub mod cursor;
pub mod kinds;
pub mod scanner;

use prompt_syntax_lexer::Range;
use serde::Serialize;
use url::Url;

pub use scanner::scan_references;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    File,
    MarkdownLink,
}

/// A reference as found in text, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedReference {
    pub kind: ReferenceKind,
    pub path: String,
    /// Link label; `None` for `#file:` references.
    pub label: Option<String>,
    /// The whole match.
    pub range: Range,
    pub path_range: Range,
}

/// Resolves a reference path against the referencing document.
///
/// Relative paths resolve against the document's directory, absolute paths
/// keep its scheme and authority. Fragments and queries are dropped.
pub fn resolve_uri(base: &Url, path: &str) -> Option<Url> {
    let mut uri = base.join(path).ok()?;
    uri.set_fragment(None);
    uri.set_query(None);
    Some(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("file:///ws/.github/prompts/a.prompt.md", "./b.md", "file:///ws/.github/prompts/b.md")]
    #[case("file:///ws/.github/prompts/a.prompt.md", "b.md", "file:///ws/.github/prompts/b.md")]
    #[case("file:///ws/.github/prompts/a.prompt.md", "../docs/c.md", "file:///ws/.github/docs/c.md")]
    #[case("file:///ws/a.prompt.md", "/etc/shared.md", "file:///etc/shared.md")]
    #[case("vscode-remote://ssh-remote+box/ws/a.md", "/abs/x.md", "vscode-remote://ssh-remote+box/abs/x.md")]
    #[case("file:///ws/a.md", "b.md#section", "file:///ws/b.md")]
    #[case("file:///ws/a.md", "my%20notes.md", "file:///ws/my%20notes.md")]
    fn resolves_paths(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let base = Url::parse(base).unwrap();
        assert_eq!(resolve_uri(&base, path).unwrap().as_str(), expected);
    }
}
