//! # File Locator
//!
//! Finds prompt files of one type in workspace or user storage.
//!
//! Each configured source folder is split into a literal parent directory
//! and an optional residual glob:
//!
//! ```text
//! .github/prompts          → .github/prompts/        (list one level)
//! packages/*/prompts       → packages/ + */prompts   (search)
//! ```
//!
//! Plain folders are listed through [`FileService`]; glob folders are
//! handed to [`SearchService`]. Results keep discovery order with
//! duplicates across roots removed.

use indexmap::IndexSet;
use parking_lot::RwLock;
use prompt_syntax_config::Config;
use relative_path::RelativePath;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::io::{FileService, SearchError, SearchQuery, SearchService};
use crate::models::DocumentType;

/// Where configured source folders come from.
pub trait SourceFolderConfig: Send + Sync {
    /// Folders for one document type: relative, absolute, or glob-bearing.
    fn source_folders(&self, document_type: DocumentType) -> Vec<String>;
    fn user_data_dir(&self) -> PathBuf;
    fn excludes(&self) -> Vec<String>;
    fn use_ignore_files(&self) -> bool;
}

impl SourceFolderConfig for Config {
    fn source_folders(&self, document_type: DocumentType) -> Vec<String> {
        match document_type {
            DocumentType::Prompt => self.locations.prompt.clone(),
            DocumentType::Instructions => self.locations.instructions.clone(),
            DocumentType::Mode => self.locations.mode.clone(),
        }
    }

    fn user_data_dir(&self) -> PathBuf {
        self.user_data_dir.clone()
    }

    fn excludes(&self) -> Vec<String> {
        self.search.exclude.clone()
    }

    fn use_ignore_files(&self) -> bool {
        self.search.use_ignore_files
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Source folders under the workspace roots.
    Local,
    /// The user data directory.
    User,
}

/// A folder to look in: a directory URI and the glob left to match below it.
pub type FolderQuery = (Url, Option<String>);

/// Splits a path into its literal parent and the residual glob.
///
/// Segments are scanned left to right; the first one holding `*`, `?`, or
/// a balanced `[]`/`{}` pair starts the residual.
pub fn split_glob(path: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.iter().position(|segment| is_glob_segment(segment)) {
        None => (path.to_string(), None),
        Some(i) => {
            let parent = segments[..i].join("/");
            let residual = segments[i..].join("/");
            let parent = if parent.is_empty() && path.starts_with('/') {
                "/".to_string()
            } else {
                parent
            };
            (parent, Some(residual))
        }
    }
}

fn is_glob_segment(segment: &str) -> bool {
    segment.contains(['*', '?']) || balanced(segment, '[', ']') || balanced(segment, '{', '}')
}

fn balanced(segment: &str, open: char, close: char) -> bool {
    segment
        .find(open)
        .is_some_and(|start| segment[start + 1..].contains(close))
}

pub struct FileLocator {
    workspace_roots: Vec<Url>,
    config: RwLock<Arc<dyn SourceFolderConfig>>,
    files: Arc<dyn FileService>,
    search: Arc<dyn SearchService>,
    changes: watch::Sender<u64>,
}

impl FileLocator {
    pub fn new(
        workspace_roots: Vec<Url>,
        config: Arc<dyn SourceFolderConfig>,
        files: Arc<dyn FileService>,
        search: Arc<dyn SearchService>,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            workspace_roots: workspace_roots.into_iter().map(as_directory).collect(),
            config: RwLock::new(config),
            files,
            search,
            changes,
        }
    }

    pub fn workspace_roots(&self) -> &[Url] {
        &self.workspace_roots
    }

    /// Replaces the configuration and fires the change event.
    pub fn set_config(&self, config: Arc<dyn SourceFolderConfig>) {
        *self.config.write() = config;
        self.notify_configuration_changed();
    }

    /// Change counter, bumped whenever the located files may differ.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn notify_configuration_changed(&self) {
        self.changes.send_modify(|n| *n += 1);
    }

    /// Fires the change event if `uri` looks like a prompt file.
    pub fn notify_file_changed(&self, uri: &Url) {
        if DocumentType::from_uri(uri).is_some() {
            log::debug!("prompt file changed: {uri}");
            self.notify_configuration_changed();
        }
    }

    /// Directories to look in for one type and scope, deduplicated.
    pub fn folder_queries(&self, document_type: DocumentType, scope: StorageScope) -> Vec<FolderQuery> {
        let config = Arc::clone(&self.config.read());
        let mut queries = IndexSet::new();

        match scope {
            StorageScope::User => match Url::from_directory_path(config.user_data_dir()) {
                Ok(base) => {
                    queries.insert((base, None));
                }
                Err(()) => log::warn!(
                    "user data directory {} is not absolute",
                    config.user_data_dir().display()
                ),
            },
            StorageScope::Local => {
                for folder in config.source_folders(document_type) {
                    let (parent, residual) = split_glob(&folder);
                    let parent = directory_path(&parent);
                    for root in &self.workspace_roots {
                        match root.join(&parent) {
                            Ok(base) => {
                                queries.insert((base, residual.clone()));
                            }
                            Err(e) => log::warn!("cannot resolve source folder '{folder}': {e}"),
                        }
                    }
                }
            }
        }

        queries.into_iter().collect()
    }

    /// Existing files of `document_type` in `scope`, in discovery order.
    pub async fn list_files(
        &self,
        document_type: DocumentType,
        scope: StorageScope,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, SearchError> {
        let (excludes, use_ignore_files) = {
            let config = self.config.read();
            (config.excludes(), config.use_ignore_files())
        };
        let extension = document_type.file_extension();
        let mut found = IndexSet::new();

        for (base, residual) in self.folder_queries(document_type, scope) {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let candidates = match residual {
                None => match self.files.read_dir(&base).await {
                    Ok(entries) => entries
                        .into_iter()
                        .filter(|e| !e.is_dir)
                        .map(|e| e.uri)
                        .collect(),
                    Err(e) => {
                        log::debug!("skipping source folder {base}: {e}");
                        Vec::new()
                    }
                },
                Some(glob) => {
                    let query = SearchQuery {
                        base: base.clone(),
                        pattern: search_pattern(&glob, extension),
                        excludes: excludes.clone(),
                        use_ignore_files,
                    };
                    match self.search.search(&query, cancel).await {
                        Ok(uris) => uris,
                        Err(SearchError::Cancelled) => return Err(SearchError::Cancelled),
                        Err(e) => {
                            log::debug!("skipping source folder {base}: {e}");
                            Vec::new()
                        }
                    }
                }
            };

            found.extend(
                candidates
                    .into_iter()
                    .filter(|uri| DocumentType::from_uri(uri) == Some(document_type)),
            );
        }

        Ok(found.into_iter().collect())
    }
}

/// The file glob for a residual folder glob. A residual that already
/// names files, like `prompts/*.prompt.md`, is used as is.
fn search_pattern(glob: &str, extension: &str) -> String {
    let glob = glob.trim_end_matches('/');
    if glob.ends_with(extension) {
        glob.to_string()
    } else {
        format!("{glob}/*{extension}")
    }
}

/// `path` normalized with a trailing slash, so joining keeps the last
/// segment as a directory.
fn directory_path(path: &str) -> String {
    if path.starts_with('/') {
        let trimmed = path.trim_end_matches('/');
        return format!("{trimmed}/");
    }
    let normalized = RelativePath::new(path).normalize();
    if normalized.as_str().is_empty() {
        "./".to_string()
    } else {
        format!("{normalized}/")
    }
}

fn as_directory(mut uri: Url) -> Url {
    if !uri.path().ends_with('/') {
        let path = format!("{}/", uri.path());
        uri.set_path(&path);
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{LocalFileService, WalkSearch};
    use crate::tests::{create_test_dir, create_test_file, uri};
    use pretty_assertions::assert_eq;
    use prompt_syntax_config::Locations;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(".github/prompts", ".github/prompts", None)]
    #[case("packages/*/prompts", "packages", Some("*/prompts"))]
    #[case(".github/**", ".github", Some("**"))]
    #[case("/abs/[ab]/x", "/abs", Some("[ab]/x"))]
    #[case("docs/{a,b}", "docs", Some("{a,b}"))]
    #[case("docs/[a", "docs/[a", None)]
    #[case("/*/prompts", "/", Some("*/prompts"))]
    #[case("**/prompts", "", Some("**/prompts"))]
    fn splits_globs(#[case] path: &str, #[case] parent: &str, #[case] residual: Option<&str>) {
        assert_eq!(
            split_glob(path),
            (parent.to_string(), residual.map(str::to_string))
        );
    }

    fn config(prompt: &[&str], user_data_dir: PathBuf) -> Arc<Config> {
        Arc::new(Config {
            locations: Locations {
                prompt: prompt.iter().map(|s| s.to_string()).collect(),
                ..Locations::default()
            },
            user_data_dir,
            ..Config::default()
        })
    }

    fn locator(roots: &[&TempDir], config: Arc<Config>) -> FileLocator {
        FileLocator::new(
            roots
                .iter()
                .map(|d| Url::from_directory_path(d.path()).unwrap())
                .collect(),
            config,
            Arc::new(LocalFileService),
            Arc::new(WalkSearch),
        )
    }

    fn names(uris: &[Url]) -> Vec<String> {
        uris.iter()
            .map(|u| u.path_segments().unwrap().next_back().unwrap().to_string())
            .collect()
    }

    #[test]
    fn folder_queries_join_relative_and_rewrite_absolute_paths() {
        let locator = FileLocator::new(
            vec![
                uri("file:///ws/one"),
                uri("vscode-remote://ssh-remote+box/home/me/two/"),
            ],
            config(&["./.github/prompts/../prompts", "/etc/prompts"], PathBuf::from("/u")),
            Arc::new(LocalFileService),
            Arc::new(WalkSearch),
        );

        let bases: Vec<String> = locator
            .folder_queries(DocumentType::Prompt, StorageScope::Local)
            .into_iter()
            .map(|(base, _)| base.to_string())
            .collect();

        assert_eq!(
            bases,
            vec![
                "file:///ws/one/.github/prompts/",
                "vscode-remote://ssh-remote+box/home/me/two/.github/prompts/",
                "file:///etc/prompts/",
                "vscode-remote://ssh-remote+box/etc/prompts/",
            ]
        );
    }

    #[test]
    fn user_scope_uses_the_user_data_dir() {
        let locator = FileLocator::new(
            vec![uri("file:///ws/")],
            config(&[".github/prompts"], PathBuf::from("/home/me/prompts")),
            Arc::new(LocalFileService),
            Arc::new(WalkSearch),
        );
        assert_eq!(
            locator.folder_queries(DocumentType::Prompt, StorageScope::User),
            vec![(uri("file:///home/me/prompts/"), None)]
        );
    }

    #[tokio::test]
    async fn lists_plain_folders_one_level_deep() {
        let ws = create_test_dir();
        let user = create_test_dir();
        create_test_file(&ws, ".github/prompts/a.prompt.md", "");
        create_test_file(&ws, ".github/prompts/notes.md", "");
        create_test_file(&ws, ".github/prompts/rust.instructions.md", "");
        create_test_file(&ws, ".github/prompts/nested/b.prompt.md", "");

        let locator = locator(&[&ws], config(&[".github/prompts"], user.path().to_path_buf()));
        let found = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&found), vec!["a.prompt.md"]);
    }

    #[tokio::test]
    async fn glob_folders_are_searched() {
        let ws = create_test_dir();
        let user = create_test_dir();
        create_test_file(&ws, "packages/api/prompts/api.prompt.md", "");
        create_test_file(&ws, "packages/web/prompts/web.prompt.md", "");
        create_test_file(&ws, "packages/web/prompts/deep/skip.prompt.md", "");
        create_test_file(&ws, "packages/web/other/skip.prompt.md", "");

        let locator = locator(&[&ws], config(&["packages/*/prompts"], user.path().to_path_buf()));
        let found = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&found), vec!["api.prompt.md", "web.prompt.md"]);
    }

    #[rstest]
    #[case("*/prompts", "*/prompts/*.prompt.md")]
    #[case("**/", "**/*.prompt.md")]
    #[case("*/prompts/*.prompt.md", "*/prompts/*.prompt.md")]
    #[case("**/*.prompt.md", "**/*.prompt.md")]
    fn search_patterns(#[case] glob: &str, #[case] expected: &str) {
        assert_eq!(search_pattern(glob, ".prompt.md"), expected);
    }

    #[tokio::test]
    async fn file_globs_are_searched_as_given() {
        let ws = create_test_dir();
        let user = create_test_dir();
        create_test_file(&ws, "packages/api/prompts/api.prompt.md", "");
        create_test_file(&ws, "packages/api/prompts/notes.md", "");

        let locator = locator(
            &[&ws],
            config(&["packages/*/prompts/*.prompt.md"], user.path().to_path_buf()),
        );
        let found = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&found), vec!["api.prompt.md"]);
    }

    #[tokio::test]
    async fn results_are_deduplicated_across_folders() {
        let ws = create_test_dir();
        let user = create_test_dir();
        create_test_file(&ws, "prompts/a.prompt.md", "");

        let locator = locator(
            &[&ws],
            config(&["prompts", "./prompts/", "prom*"], user.path().to_path_buf()),
        );
        let found = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn missing_folders_yield_nothing() {
        let ws = create_test_dir();
        let user = create_test_dir();
        let locator = locator(&[&ws], config(&["nowhere"], user.path().to_path_buf()));

        let found = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &CancellationToken::new())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn user_scope_lists_user_storage() {
        let ws = create_test_dir();
        let user = create_test_dir();
        create_test_file(&user, "mine.prompt.md", "");
        create_test_file(&user, "planner.chatmode.md", "");

        let locator = locator(&[&ws], config(&[".github/prompts"], user.path().to_path_buf()));
        let found = locator
            .list_files(DocumentType::Mode, StorageScope::User, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&found), vec!["planner.chatmode.md"]);
    }

    #[tokio::test]
    async fn cancelled_listing_fails() {
        let ws = create_test_dir();
        let user = create_test_dir();
        let locator = locator(&[&ws], config(&["prompts"], user.path().to_path_buf()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = locator
            .list_files(DocumentType::Prompt, StorageScope::Local, &cancel)
            .await;
        assert!(matches!(result, Err(SearchError::Cancelled)));
    }

    #[test]
    fn change_event_fires_for_config_and_prompt_files() {
        let user = create_test_dir();
        let locator = locator(&[], config(&[], user.path().to_path_buf()));
        let mut changes = locator.subscribe();

        locator.notify_file_changed(&uri("file:///ws/readme.md"));
        assert!(!changes.has_changed().unwrap());

        locator.notify_file_changed(&uri("file:///ws/a.instructions.md"));
        assert_eq!(*changes.borrow_and_update(), 1);

        locator.set_config(config(&["other"], user.path().to_path_buf()));
        assert_eq!(*changes.borrow_and_update(), 2);
    }
}
