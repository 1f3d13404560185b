//! One live parser per open document.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::document::{DocumentId, TextDocument};
use crate::io::FileService;
use crate::parser::PromptParser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("document {0} is disposed")]
    DocumentDisposed(url::Url),
    #[error("parser for {0} was disposed while being created")]
    ParserDisposed(url::Url),
}

type Entries = Mutex<HashMap<DocumentId, PromptParser>>;

/// Caches one started [`PromptParser`] per [`TextDocument`].
///
/// Entries are evicted when their parser is disposed, either explicitly or
/// because its document was, so the next [`ParserRegistry::get`] builds a
/// fresh one.
#[derive(Clone)]
pub struct ParserRegistry {
    entries: Arc<Entries>,
    files: Arc<dyn FileService>,
}

impl ParserRegistry {
    pub fn new(files: Arc<dyn FileService>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            files,
        }
    }

    pub fn get(&self, document: &TextDocument) -> Result<PromptParser, RegistryError> {
        if document.is_disposed() {
            return Err(RegistryError::DocumentDisposed(document.uri().clone()));
        }

        let parser = {
            let mut entries = self.entries.lock();
            if let Some(parser) = entries.get(&document.id())
                && !parser.is_disposed()
            {
                return Ok(parser.clone());
            }
            let parser = PromptParser::new(document.clone(), Arc::clone(&self.files));
            entries.insert(document.id(), parser.clone());
            parser
        };

        // callbacks may run right away, so the map must be unlocked here
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        let (id, parser_id) = (document.id(), parser.id());
        parser.on_dispose(move || {
            if let Some(entries) = entries.upgrade() {
                let mut entries = entries.lock();
                if entries.get(&id).is_some_and(|p| p.id() == parser_id) {
                    entries.remove(&id);
                }
            }
        });

        if parser.start().is_disposed() {
            return Err(RegistryError::ParserDisposed(document.uri().clone()));
        }
        log::debug!("created parser for {}", document.uri());
        Ok(parser)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes every cached parser.
    pub fn clear(&self) {
        let parsers: Vec<PromptParser> = self.entries.lock().drain().map(|(_, p)| p).collect();
        for parser in parsers {
            parser.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{MemoryFiles, uri};
    use std::time::Duration;

    fn registry() -> ParserRegistry {
        ParserRegistry::new(MemoryFiles::new(&[]))
    }

    fn document(name: &str) -> TextDocument {
        TextDocument::new(uri(&format!("file:///ws/{name}.prompt.md")), "body")
    }

    async fn until_evicted(registry: &ParserRegistry, expected: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.len() != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn returns_the_same_parser_per_document() {
        let registry = registry();
        let doc = document("a");

        let first = registry.get(&doc).unwrap();
        let second = registry.get(&doc).unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(registry.len(), 1);
        first.settled().await.unwrap();
    }

    #[tokio::test]
    async fn distinct_documents_get_distinct_parsers() {
        let registry = registry();
        let a = registry.get(&document("a")).unwrap();
        let b = registry.get(&document("a")).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn disposed_document_is_rejected() {
        let registry = registry();
        let doc = document("a");
        doc.dispose();
        assert_eq!(
            registry.get(&doc).unwrap_err(),
            RegistryError::DocumentDisposed(doc.uri().clone())
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn document_disposal_evicts_only_its_parser() {
        let registry = registry();
        let a = document("a");
        let b = document("b");
        let parser_a = registry.get(&a).unwrap();
        let parser_b = registry.get(&b).unwrap();

        a.dispose();
        until_evicted(&registry, 1).await;

        assert!(parser_a.is_disposed());
        assert!(!parser_b.is_disposed());
        assert_eq!(registry.get(&b).unwrap().id(), parser_b.id());
        assert!(registry.get(&a).is_err());
    }

    #[tokio::test]
    async fn explicit_parser_disposal_rebuilds_on_next_get() {
        let registry = registry();
        let doc = document("a");
        let first = registry.get(&doc).unwrap();

        first.dispose();
        assert!(registry.is_empty());

        let second = registry.get(&doc).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(!second.is_disposed());
        second.settled().await.unwrap();
    }

    #[tokio::test]
    async fn stale_callback_does_not_evict_a_newer_parser() {
        let registry = registry();
        let doc = document("a");
        let first = registry.get(&doc).unwrap();
        first.dispose();
        let second = registry.get(&doc).unwrap();

        // disposing again is a no-op and must not touch the new entry
        first.dispose();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&doc).unwrap().id(), second.id());
    }

    #[tokio::test]
    async fn clear_disposes_everything() {
        let registry = registry();
        let parser = registry.get(&document("a")).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(parser.is_disposed());
    }
}
