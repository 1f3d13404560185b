//! Externally owned text documents.
//!
//! A [`TextDocument`] is a cheap, cloneable handle to a text buffer kept in
//! an `xi_rope::Rope`. Whoever opened the document edits and disposes it;
//! parsers only observe it through [`TextDocument::subscribe`], which yields
//! a `watch` receiver that always holds the latest [`DocumentState`].
//! Bursts of edits coalesce: a slow observer sees only the newest version.

use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use url::Url;
use xi_rope::Rope;

use crate::models::DocumentType;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one open document, distinct even for equal URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What observers are told after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentState {
    pub version: u64,
    pub disposed: bool,
}

struct Content {
    buffer: Rope,
    version: u64,
}

struct DocumentInner {
    id: DocumentId,
    uri: Url,
    document_type: DocumentType,
    content: Mutex<Content>,
    state: watch::Sender<DocumentState>,
}

#[derive(Clone)]
pub struct TextDocument {
    inner: Arc<DocumentInner>,
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("id", &self.inner.id)
            .field("uri", &self.inner.uri.as_str())
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl TextDocument {
    /// Opens a document whose type is inferred from its file name.
    pub fn new(uri: Url, text: &str) -> Self {
        let document_type = DocumentType::infer(&uri);
        Self::with_type(uri, document_type, text)
    }

    pub fn with_type(uri: Url, document_type: DocumentType, text: &str) -> Self {
        let (state, _) = watch::channel(DocumentState {
            version: 1,
            disposed: false,
        });
        Self {
            inner: Arc::new(DocumentInner {
                id: DocumentId::next(),
                uri,
                document_type,
                content: Mutex::new(Content {
                    buffer: Rope::from(text),
                    version: 1,
                }),
                state,
            }),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    pub fn uri(&self) -> &Url {
        &self.inner.uri
    }

    pub fn document_type(&self) -> DocumentType {
        self.inner.document_type
    }

    pub fn version(&self) -> u64 {
        self.inner.content.lock().version
    }

    pub fn text(&self) -> String {
        self.inner.content.lock().buffer.to_string()
    }

    /// Version and text read together, so they always match.
    pub fn snapshot(&self) -> (u64, String) {
        let content = self.inner.content.lock();
        (content.version, content.buffer.to_string())
    }

    /// Replaces the whole text.
    pub fn set_text(&self, text: &str) {
        let len = self.inner.content.lock().buffer.len();
        self.edit(0..len, text);
    }

    /// Replaces the bytes in `range` with `text`.
    pub fn edit(&self, range: Range<usize>, text: &str) {
        if self.is_disposed() {
            log::warn!("ignoring edit to disposed document {}", self.inner.uri);
            return;
        }

        let version = {
            let mut content = self.inner.content.lock();
            let len = content.buffer.len();
            let range = range.start.min(len)..range.end.min(len);
            content.buffer.edit(range, text);
            content.version += 1;
            content.version
        };

        self.inner.state.send_replace(DocumentState {
            version,
            disposed: false,
        });
    }

    /// Marks the document closed. Observers are notified once.
    pub fn dispose(&self) {
        let version = self.version();
        self.inner.state.send_if_modified(|state| {
            if state.disposed {
                return false;
            }
            *state = DocumentState {
                version,
                disposed: true,
            };
            true
        });
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.inner.state.subscribe()
    }
}
