use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

use crate::io::{DirEntry, FileError, FileService};

/// Create a temporary workspace directory
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content, creating parent directories as needed
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

pub fn uri(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// In-memory [`FileService`] keyed by URI.
#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<BTreeMap<Url, String>>,
    reads: Mutex<Vec<Url>>,
}

impl MemoryFiles {
    pub fn new(files: &[(&str, &str)]) -> Arc<Self> {
        let service = Self::default();
        for (u, text) in files {
            service.insert(u, text);
        }
        Arc::new(service)
    }

    pub fn insert(&self, u: &str, text: &str) {
        self.files.lock().insert(uri(u), text.to_string());
    }

    pub fn remove(&self, u: &str) {
        self.files.lock().remove(&uri(u));
    }

    /// Every URI read so far, in order.
    pub fn reads(&self) -> Vec<Url> {
        self.reads.lock().clone()
    }
}

#[async_trait]
impl FileService for MemoryFiles {
    async fn read(&self, uri: &Url) -> Result<String, FileError> {
        self.reads.lock().push(uri.clone());
        self.files
            .lock()
            .get(uri)
            .cloned()
            .ok_or_else(|| FileError::NotFound(uri.clone()))
    }

    async fn read_dir(&self, uri: &Url) -> Result<Vec<DirEntry>, FileError> {
        let prefix = uri.as_str().trim_end_matches('/').to_string() + "/";
        let files = self.files.lock();
        let mut entries: Vec<DirEntry> = Vec::new();
        for key in files.keys() {
            let Some(rest) = key.as_str().strip_prefix(&prefix) else {
                continue;
            };
            let (name, is_dir) = match rest.split_once('/') {
                Some((dir, _)) => (format!("{dir}/"), true),
                None => (rest.to_string(), false),
            };
            let entry = DirEntry {
                uri: Url::parse(&(prefix.clone() + &name)).unwrap(),
                is_dir,
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        if entries.is_empty() {
            return Err(FileError::NotFound(uri.clone()));
        }
        Ok(entries)
    }
}
