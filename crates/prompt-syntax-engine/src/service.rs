//! Entry point tying the registry, the locator and the resolver together.

use futures::future::join_all;
use glob::{MatchOptions, Pattern};
use indexmap::IndexSet;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::document::TextDocument;
use crate::io::{FileService, LocalFileService, SearchError, SearchService, WalkSearch};
use crate::locator::{FileLocator, SourceFolderConfig, StorageScope};
use crate::models::{DocumentType, Metadata};
use crate::parser::PromptParser;
use crate::parsing::{PromptNode, Reference, parse_shallow, parse_tree};
use crate::registry::{ParserRegistry, RegistryError};
use crate::tree::{Mapped, Tree, map};

const APPLY_TO_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One node of a metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub uri: Url,
    pub metadata: Metadata,
}

impl MetadataEntry {
    fn of(node: &PromptNode) -> Self {
        Self {
            uri: node.uri.clone(),
            metadata: node.metadata().clone(),
        }
    }
}

pub struct PromptSyntaxService {
    files: Arc<dyn FileService>,
    registry: ParserRegistry,
    locator: FileLocator,
}

impl PromptSyntaxService {
    pub fn new(
        workspace_roots: Vec<Url>,
        config: Arc<dyn SourceFolderConfig>,
        files: Arc<dyn FileService>,
        search: Arc<dyn SearchService>,
    ) -> Self {
        Self {
            registry: ParserRegistry::new(Arc::clone(&files)),
            locator: FileLocator::new(workspace_roots, config, Arc::clone(&files), search),
            files,
        }
    }

    /// A service over the local filesystem.
    pub fn local(workspace_roots: Vec<Url>, config: Arc<dyn SourceFolderConfig>) -> Self {
        Self::new(
            workspace_roots,
            config,
            Arc::new(LocalFileService),
            Arc::new(WalkSearch),
        )
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    /// The live parser for an open document.
    pub fn parser_for(&self, document: &TextDocument) -> Result<PromptParser, RegistryError> {
        self.registry.get(document)
    }

    pub async fn list_files(
        &self,
        document_type: DocumentType,
        scope: StorageScope,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, SearchError> {
        self.locator.list_files(document_type, scope, cancel).await
    }

    /// Fully resolved metadata trees, one per readable root.
    ///
    /// Children follow references; broken and recursive references are
    /// left out.
    pub async fn get_all_metadata(&self, uris: &[Url]) -> Vec<Tree<MetadataEntry>> {
        let trees = uris.iter().map(|uri| async move {
            let text = match self.files.read(uri).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("skipping {uri}: {e}");
                    return None;
                }
            };
            let node =
                parse_tree(uri, DocumentType::infer(uri), &text, Arc::clone(&self.files)).await;
            Some(metadata_tree(&node))
        });

        join_all(trees).await.into_iter().flatten().collect()
    }

    /// Instruction files, local and user, whose `applyTo` matches at least
    /// one of `targets`.
    pub async fn find_files_applicable_to(
        &self,
        targets: &[Url],
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, SearchError> {
        let mut candidates = IndexSet::new();
        for scope in [StorageScope::Local, StorageScope::User] {
            candidates.extend(
                self.list_files(DocumentType::Instructions, scope, cancel)
                    .await?,
            );
        }

        let mut applicable = Vec::new();
        for uri in candidates {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
            let text = match self.files.read(&uri).await {
                Ok(text) => text,
                Err(e) => {
                    log::debug!("skipping {uri}: {e}");
                    continue;
                }
            };
            let node = parse_shallow(&uri, DocumentType::Instructions, &text);
            if let Some(apply_to) = node.metadata().apply_to()
                && targets.iter().any(|target| applies_to(apply_to, target))
            {
                applicable.push(uri);
            }
        }
        Ok(applicable)
    }
}

fn metadata_tree(root: &PromptNode) -> Tree<MetadataEntry> {
    let children = root
        .references
        .iter()
        .map(|reference| map(reference, &mut metadata_entry))
        .filter_map(prune)
        .collect();
    Tree::node(MetadataEntry::of(root), children)
}

/// Maps a reference to its target's metadata, dropping unresolved children
/// in place.
fn metadata_entry(
    reference: &Reference,
    children: Option<&mut Vec<Tree<Option<MetadataEntry>>>>,
) -> Mapped<Option<MetadataEntry>> {
    if let Some(children) = children {
        children.retain(|child| child.value.is_some());
    }
    Mapped::new(reference.node().map(MetadataEntry::of))
}

fn prune(tree: Tree<Option<MetadataEntry>>) -> Option<Tree<MetadataEntry>> {
    Some(Tree {
        value: tree.value?,
        children: tree
            .children
            .map(|children| children.into_iter().filter_map(prune).collect()),
    })
}

/// Whether a comma-separated `applyTo` list matches `target`'s path.
///
/// Patterns not anchored with `/` or `**` match at any depth.
pub fn applies_to(apply_to: &str, target: &Url) -> bool {
    let path = target.path().trim_start_matches('/');
    apply_to
        .split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| {
            let pattern = if pattern.starts_with('/') || pattern.starts_with("**") {
                pattern.trim_start_matches('/').to_string()
            } else {
                format!("**/{pattern}")
            };
            Pattern::new(&pattern).is_ok_and(|p| p.matches_with(path, APPLY_TO_OPTIONS))
        })
}
