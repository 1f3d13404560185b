//! File access behind traits, so the resolver and the locator never touch
//! the filesystem directly.

pub mod search;

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use url::Url;

pub use search::{SearchError, SearchQuery, SearchService, WalkSearch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(Url),
    #[error("Cannot read {uri}: {reason}")]
    NotReadable { uri: Url, reason: String },
    #[error("Not a directory: {0}")]
    NotADirectory(Url),
    #[error("Cannot resolve path '{0}'")]
    Unresolvable(String),
}

impl FileError {
    fn from_io(uri: &Url, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(uri.clone()),
            std::io::ErrorKind::NotADirectory => FileError::NotADirectory(uri.clone()),
            _ => FileError::NotReadable {
                uri: uri.clone(),
                reason: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub uri: Url,
    pub is_dir: bool,
}

/// Reads documents and lists directories by URI.
#[async_trait]
pub trait FileService: Send + Sync {
    async fn read(&self, uri: &Url) -> Result<String, FileError>;

    /// Entries of a directory, one level deep, sorted by URI.
    async fn read_dir(&self, uri: &Url) -> Result<Vec<DirEntry>, FileError>;
}

/// Converts a `file:` URI to a local path.
pub fn local_path(uri: &Url) -> Result<std::path::PathBuf, FileError> {
    uri.to_file_path().map_err(|()| FileError::NotReadable {
        uri: uri.clone(),
        reason: "not a local file".to_string(),
    })
}

pub fn file_uri(path: &Path) -> Result<Url, FileError> {
    Url::from_file_path(path).map_err(|()| FileError::Unresolvable(path.display().to_string()))
}

/// [`FileService`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileService;

#[async_trait]
impl FileService for LocalFileService {
    async fn read(&self, uri: &Url) -> Result<String, FileError> {
        let path = local_path(uri)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FileError::from_io(uri, e))
    }

    async fn read_dir(&self, uri: &Url) -> Result<Vec<DirEntry>, FileError> {
        let path = local_path(uri)?;
        if !tokio::fs::metadata(&path)
            .await
            .map_err(|e| FileError::from_io(uri, e))?
            .is_dir()
        {
            return Err(FileError::NotADirectory(uri.clone()));
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| FileError::from_io(uri, e))?;
        while let Some(entry) = dir.next_entry().await.map_err(|e| FileError::from_io(uri, e))? {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| FileError::from_io(uri, e))?
                .is_dir();
            entries.push(DirEntry {
                uri: file_uri(&entry.path())?,
                is_dir,
            });
        }

        entries.sort_by(|a, b| a.uri.as_str().cmp(b.uri.as_str()));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "a.prompt.md", "# Hello");

        let text = LocalFileService.read(&file_uri(&path).unwrap()).await.unwrap();
        assert_eq!(text, "# Hello");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = create_test_dir();
        let uri = file_uri(&dir.path().join("missing.md")).unwrap();

        let result = LocalFileService.read(&uri).await;
        assert_eq!(result, Err(FileError::NotFound(uri)));
    }

    #[tokio::test]
    async fn non_file_uri_is_not_readable() {
        let uri = Url::parse("https://example.com/a.md").unwrap();
        let result = LocalFileService.read(&uri).await;
        assert!(matches!(result, Err(FileError::NotReadable { .. })));
    }

    #[tokio::test]
    async fn lists_directory_one_level_deep() {
        let dir = create_test_dir();
        create_test_file(&dir, "b.prompt.md", "");
        create_test_file(&dir, "a.prompt.md", "");
        create_test_file(&dir, "nested/c.prompt.md", "");

        let entries = LocalFileService
            .read_dir(&file_uri(dir.path()).unwrap())
            .await
            .unwrap();

        let names: Vec<_> = entries
            .iter()
            .map(|e| (e.uri.path_segments().unwrap().next_back().unwrap().to_string(), e.is_dir))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.prompt.md".to_string(), false),
                ("b.prompt.md".to_string(), false),
                ("nested".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn listing_a_file_fails() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "a.md", "");
        let uri = file_uri(&path).unwrap();

        let result = LocalFileService.read_dir(&uri).await;
        assert_eq!(result, Err(FileError::NotADirectory(uri)));
    }
}
