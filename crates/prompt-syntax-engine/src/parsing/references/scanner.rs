use prompt_syntax_lexer::{Line, Range, Token, TokenKind};

use super::cursor::Cursor;
use super::kinds::{CodeFence, CodeSpan, FenceKind, FileReference, MarkdownLink};
use super::{ReferenceKind, ScannedReference};

/// Scans body lines for references, in textual order.
///
/// # Raw Zone Precedence
/// Fenced blocks and code spans are checked first and suppress everything
/// inside them: `` `#file:a.md` `` is code, not a reference.
pub fn scan_references(lines: &[Line<'_>]) -> Vec<ScannedReference> {
    let mut out = Vec::new();
    let mut fence: Option<FenceKind> = None;

    for line in lines {
        let text = line.text();
        if let Some(open) = fence {
            if CodeFence::closes(open, &text) {
                fence = None;
            }
            continue;
        }
        if let Some(kind) = CodeFence::kind(&text) {
            fence = Some(kind);
            continue;
        }
        scan_line(line.tokens(), &mut out);
    }

    out
}

fn scan_line(tokens: &[Token<'_>], out: &mut Vec<ScannedReference>) {
    let mut cur = Cursor::new(tokens);

    while !cur.eof() {
        if skip_code_span(&mut cur) {
            continue;
        }
        if let Some(reference) = try_file_reference(&mut cur).or_else(|| try_markdown_link(&mut cur)) {
            if MarkdownLink::is_document_target(&reference.path) {
                out.push(reference);
            }
            continue;
        }
        cur.bump();
    }
}

fn concat(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect()
}

fn span(tokens: &[Token<'_>]) -> Range {
    Range::new(tokens[0].range.start, tokens[tokens.len() - 1].range.end)
}

/// Skips a closed code span. An unclosed tick is left for the caller.
fn skip_code_span(cur: &mut Cursor<'_, '_>) -> bool {
    if !cur.at(CodeSpan::TICK) {
        return false;
    }

    let saved = cur.clone();
    cur.bump();
    cur.bump_while(|t| t.kind != CodeSpan::TICK);
    if cur.bump().is_none() {
        *cur = saved;
        return false;
    }
    true
}

/// Attempts `#file:<path>` at the current position, restoring the cursor
/// on failure.
fn try_file_reference(cur: &mut Cursor<'_, '_>) -> Option<ScannedReference> {
    if !cur.at(FileReference::MARKER) {
        return None;
    }

    let saved = cur.clone();
    let result = (|| {
        let start = cur.bump()?.range.start;
        let keyword = cur.bump()?;
        if keyword.kind != TokenKind::Word || keyword.text != FileReference::KEYWORD {
            return None;
        }
        if cur.bump()?.kind != FileReference::SEPARATOR {
            return None;
        }

        let path = cur.bump_while(|t| t.kind != TokenKind::Whitespace);
        if path.is_empty() {
            return None;
        }
        let path_range = span(path);
        Some(ScannedReference {
            kind: ReferenceKind::File,
            path: concat(path),
            label: None,
            range: Range::new(start, path_range.end),
            path_range,
        })
    })();

    if result.is_none() {
        *cur = saved;
    }
    result
}

/// Attempts `[label](<path>)` at the current position, restoring the cursor
/// on failure. Images (`![alt](src)`) are not references.
fn try_markdown_link(cur: &mut Cursor<'_, '_>) -> Option<ScannedReference> {
    if !cur.at(MarkdownLink::LABEL_OPEN) {
        return None;
    }
    if cur.prev().is_some_and(|t| t.text.ends_with(MarkdownLink::IMAGE)) {
        return None;
    }

    let saved = cur.clone();
    let result = (|| {
        let start = cur.bump()?.range.start;
        let label = cur.bump_while(|t| {
            t.kind != MarkdownLink::LABEL_CLOSE && t.kind != MarkdownLink::LABEL_OPEN
        });
        if cur.bump()?.kind != MarkdownLink::LABEL_CLOSE {
            return None;
        }
        if cur.bump()?.kind != MarkdownLink::TARGET_OPEN {
            return None;
        }

        let path = cur.bump_while(|t| {
            t.kind != MarkdownLink::TARGET_CLOSE && t.kind != TokenKind::Whitespace
        });
        if path.is_empty() {
            return None;
        }
        let close = cur.bump()?;
        if close.kind != MarkdownLink::TARGET_CLOSE {
            return None;
        }

        Some(ScannedReference {
            kind: ReferenceKind::MarkdownLink,
            path: concat(path),
            label: Some(concat(label)),
            range: Range::new(start, close.range.end),
            path_range: span(path),
        })
    })();

    if result.is_none() {
        *cur = saved;
    }
    result
}
