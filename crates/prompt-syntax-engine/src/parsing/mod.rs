//! # Parsing
//!
//! Turns document text into a [`PromptNode`] and resolves its references
//! into a tree.
//!
//! ```text
//! text ──lex──▶ tokens ──lines──▶ header + body lines
//!                                   │          │
//!                              header::parse  references::scan
//!                                   └────┬─────┘
//!                                   PromptNode (targets Pending)
//!                                        │ resolve_references
//!                                   PromptNode (tree)
//! ```
//!
//! Parsing never fails. Header problems become diagnostics; unreadable
//! references become `OpenFailed` targets.
//!
//! ## Cycles
//!
//! Each recursive call carries the chain of URIs being parsed above it,
//! the current document included. A reference to any of them becomes a
//! `Recursive` leaf and is never read.

pub mod header;
pub mod node;
pub mod references;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use prompt_syntax_lexer::{Lexer, lines};
use std::sync::Arc;
use url::Url;

use crate::io::{FileError, FileService};
use crate::models::DocumentType;
pub use header::{Header, HeaderRecord, parse_header};
pub use node::{PromptNode, Reference, ReferenceTarget};
pub use references::{ReferenceKind, ScannedReference, resolve_uri, scan_references};

/// Parses one document without following its references.
pub fn parse_shallow(uri: &Url, document_type: DocumentType, text: &str) -> PromptNode {
    let lines = lines(Lexer::new(text));
    let (header, body_start) = parse_header(document_type, &lines);

    let references = scan_references(&lines[body_start..])
        .into_iter()
        .map(|scanned| {
            let resolved = resolve_uri(uri, &scanned.path);
            Reference::pending(scanned, resolved)
        })
        .collect();

    PromptNode {
        uri: uri.clone(),
        document_type,
        header,
        references,
    }
}

/// Parses a document and everything it references.
pub async fn parse_tree(
    uri: &Url,
    document_type: DocumentType,
    text: &str,
    files: Arc<dyn FileService>,
) -> PromptNode {
    let node = parse_shallow(uri, document_type, text);
    resolve_references(node, files, Vec::new()).await
}

/// Resolves every pending reference of `node`, recursively.
///
/// `ancestors` are the documents above `node` in the chain; `node` itself
/// is added before its children resolve. Siblings resolve concurrently and
/// keep their textual order.
pub fn resolve_references(
    mut node: PromptNode,
    files: Arc<dyn FileService>,
    mut ancestors: Vec<Url>,
) -> BoxFuture<'static, PromptNode> {
    async move {
        ancestors.push(node.uri.clone());
        let references = std::mem::take(&mut node.references);

        let resolved = references.into_iter().map(|mut reference| {
            let files = Arc::clone(&files);
            let ancestors = ancestors.clone();
            async move {
                if matches!(reference.target, ReferenceTarget::Pending) {
                    reference.target = resolve_target(&reference, files, ancestors).await;
                }
                reference
            }
        });

        node.references = join_all(resolved).await;
        node
    }
    .boxed()
}

async fn resolve_target(
    reference: &Reference,
    files: Arc<dyn FileService>,
    ancestors: Vec<Url>,
) -> ReferenceTarget {
    let Some(uri) = &reference.uri else {
        return ReferenceTarget::OpenFailed(FileError::Unresolvable(reference.path.clone()));
    };
    if ancestors.contains(uri) {
        log::debug!("recursive reference to {uri}");
        return ReferenceTarget::Recursive;
    }

    match files.read(uri).await {
        Ok(text) => {
            let child = parse_shallow(uri, DocumentType::infer(uri), &text);
            let child = resolve_references(child, files, ancestors).await;
            ReferenceTarget::Resolved(Arc::new(child))
        }
        Err(e) => {
            log::warn!("cannot open reference '{}': {e}", reference.path);
            ReferenceTarget::OpenFailed(e)
        }
    }
}
