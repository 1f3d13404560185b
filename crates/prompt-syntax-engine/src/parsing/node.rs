use prompt_syntax_lexer::Range;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use super::header::Header;
use super::references::{ReferenceKind, ScannedReference};
use crate::io::FileError;
use crate::models::{Diagnostic, DocumentType, Metadata};
use crate::tree::TreeNode;

/// One parsed document: its header and the references found in its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptNode {
    pub uri: Url,
    pub document_type: DocumentType,
    pub header: Header,
    pub references: Vec<Reference>,
}

impl PromptNode {
    pub fn metadata(&self) -> &Metadata {
        &self.header.metadata
    }

    /// Header diagnostics followed by one warning per broken or recursive
    /// reference, anchored at the reference's path.
    pub fn problems(&self) -> Vec<Diagnostic> {
        let mut problems = self.header.diagnostics.clone();
        problems.extend(self.references.iter().filter_map(Reference::problem));
        problems
    }

    /// True once every reference, transitively, has a final target.
    pub fn is_resolved(&self) -> bool {
        self.references.iter().all(|r| match &r.target {
            ReferenceTarget::Pending => false,
            ReferenceTarget::Resolved(node) => node.is_resolved(),
            ReferenceTarget::OpenFailed(_) | ReferenceTarget::Recursive => true,
        })
    }
}

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "node", rename_all = "kebab-case")]
pub enum ReferenceTarget {
    /// Not resolved yet.
    Pending,
    Resolved(Arc<PromptNode>),
    /// The target could not be read.
    OpenFailed(FileError),
    /// The target is already being parsed further up the chain.
    Recursive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub path: String,
    pub label: Option<String>,
    pub range: Range,
    pub path_range: Range,
    /// `None` when the path cannot be turned into a URI.
    pub uri: Option<Url>,
    pub target: ReferenceTarget,
}

impl Reference {
    pub fn pending(scanned: ScannedReference, uri: Option<Url>) -> Self {
        Self {
            kind: scanned.kind,
            path: scanned.path,
            label: scanned.label,
            range: scanned.range,
            path_range: scanned.path_range,
            uri,
            target: ReferenceTarget::Pending,
        }
    }

    pub fn node(&self) -> Option<&PromptNode> {
        match &self.target {
            ReferenceTarget::Resolved(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.target, ReferenceTarget::OpenFailed(_))
    }

    fn problem(&self) -> Option<Diagnostic> {
        let message = match &self.target {
            ReferenceTarget::OpenFailed(_) => {
                format!("File '{}' not found or cannot be read", self.path)
            }
            ReferenceTarget::Recursive => format!("Recursive reference to '{}'", self.path),
            ReferenceTarget::Pending | ReferenceTarget::Resolved(_) => return None,
        };
        Some(Diagnostic::warning(self.path_range, message))
    }
}

impl TreeNode for Reference {
    fn children(&self) -> Option<&[Self]> {
        self.node().map(|node| node.references.as_slice())
    }
}
