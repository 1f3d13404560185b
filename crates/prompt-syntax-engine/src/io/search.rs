//! Glob search under a base folder.
//!
//! [`SearchService`] is the seam the file locator delegates to. The
//! bundled [`WalkSearch`] walks local directories with `ignore` on a
//! blocking thread and matches every file's base-relative path against the
//! query's glob.

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{FileError, file_uri, local_path};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Folder the search starts from; `pattern` is relative to it.
    pub base: Url,
    pub pattern: String,
    pub excludes: Vec<String>,
    /// Honour `.gitignore`, `.ignore`, `info/exclude` and the global git
    /// ignore file.
    pub use_ignore_files: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search cancelled")]
    Cancelled,
    #[error("Invalid search pattern '{0}'")]
    InvalidPattern(String),
    #[error(transparent)]
    Io(#[from] FileError),
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, SearchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkSearch;

#[async_trait]
impl SearchService for WalkSearch {
    async fn search(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, SearchError> {
        let root = local_path(&query.base)?;
        let pattern = Pattern::new(&query.pattern)
            .map_err(|_| SearchError::InvalidPattern(query.pattern.clone()))?;
        let walker = build_walk(&root, query);

        let walk_cancel = cancel.clone();
        let walk = tokio::task::spawn_blocking(move || {
            let mut files = collect_matches(&root, walker, &pattern, &walk_cancel);
            files.sort();
            files
        });

        let files = tokio::select! {
            _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            joined = walk => joined.map_err(|e| FileError::NotReadable {
                uri: query.base.clone(),
                reason: e.to_string(),
            })?,
        };
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        log::debug!("search {} in {}: {} files", query.pattern, query.base, files.len());
        files
            .iter()
            .map(|path| file_uri(path).map_err(SearchError::from))
            .collect()
    }
}

/// Ignore files are honoured whether or not `root` sits in a git checkout.
fn build_walk(root: &Path, query: &SearchQuery) -> WalkBuilder {
    let mut walker = WalkBuilder::new(root);

    walker
        .hidden(false)
        .parents(false)
        .require_git(false)
        .git_ignore(query.use_ignore_files)
        .git_global(query.use_ignore_files)
        .git_exclude(query.use_ignore_files)
        .ignore(query.use_ignore_files)
        .overrides(excludes(root, &query.excludes));

    walker
}

/// Exclude globs as negated overrides, so they only ever remove files.
fn excludes(root: &Path, patterns: &[String]) -> Override {
    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        if let Err(e) = builder.add(&format!("!{pattern}")) {
            log::warn!("skipping invalid exclude pattern '{pattern}': {e}");
        }
    }
    builder.build().unwrap_or_else(|e| {
        log::warn!("ignoring excludes: {e}");
        Override::empty()
    })
}

fn collect_matches(
    root: &Path,
    walker: WalkBuilder,
    pattern: &Pattern,
    cancel: &CancellationToken,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walker.build() {
        if cancel.is_cancelled() {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("skipping entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if relative_slash_path(root, entry.path())
            .is_some_and(|relative| pattern.matches_with(&relative, MATCH_OPTIONS))
        {
            files.push(entry.into_path());
        }
    }
    files
}

/// `path` relative to `root`, with `/` separators.
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
