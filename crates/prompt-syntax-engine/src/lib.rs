//! Prompt file engine: front-matter validation, reference resolution, and
//! live per-document parsing.

pub mod document;
pub mod io;
pub mod locator;
pub mod models;
pub mod parser;
pub mod parsing;
pub mod registry;
pub mod service;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use document::{DocumentId, DocumentState, TextDocument};
pub use io::{
    DirEntry, FileError, FileService, LocalFileService, SearchError, SearchQuery, SearchService,
    WalkSearch, file_uri, local_path,
};
pub use locator::{FileLocator, SourceFolderConfig, StorageScope, split_glob};
pub use models::*;
pub use parser::{ParserError, ParserId, ParserState, PromptParser};
pub use parsing::{Header, PromptNode, Reference, ReferenceKind, ReferenceTarget};
pub use registry::{ParserRegistry, RegistryError};
pub use service::{MetadataEntry, PromptSyntaxService, applies_to};
pub use tree::{Difference, Mapped, MappedChildren, Tree, TreeNode, difference, flatten, for_each, map};
