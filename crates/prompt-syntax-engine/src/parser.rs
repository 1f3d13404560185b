//! # Parser Façade
//!
//! A [`PromptParser`] keeps the parse of one [`TextDocument`] current.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Parsing ──▶ Settled (shallow) ──▶ Settled (complete)
//!                      ▲                                   │
//!                      └────────── document edited ────────┘
//! any state ──dispose() / document disposed──▶ Disposed
//! ```
//!
//! A driver task spawned by [`PromptParser::new`] runs one pass per
//! document version. A pass first publishes the shallow parse (header and
//! pending references), then the resolved tree. An edit during a pass
//! drops the pass before it publishes anything further, so waiters only
//! ever see results for the current text.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::document::{DocumentState, TextDocument};
use crate::io::FileService;
use crate::models::{Diagnostic, Metadata};
use crate::parsing::{
    Header, PromptNode, Reference, ReferenceTarget, parse_shallow, resolve_references,
};
use crate::tree::{difference, flatten};

static NEXT_PARSER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Idle,
    Parsing { version: u64 },
    /// `complete` once every reference, transitively, is resolved.
    Settled { version: u64, complete: bool },
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParserError {
    #[error("parser was disposed")]
    Disposed,
    #[error("parser was never started")]
    NotStarted,
}

struct Snapshot {
    version: u64,
    node: Arc<PromptNode>,
    complete: bool,
}

type DisposeCallback = Box<dyn FnOnce() + Send>;

struct ParserInner {
    id: ParserId,
    document: TextDocument,
    files: Arc<dyn FileService>,
    state: watch::Sender<ParserState>,
    started: watch::Sender<bool>,
    snapshot: Mutex<Option<Snapshot>>,
    /// Last complete tree, for change detection.
    last_complete: Mutex<Option<Arc<PromptNode>>>,
    revision: watch::Sender<u64>,
    cancel: CancellationToken,
    on_dispose: Mutex<Vec<DisposeCallback>>,
}

/// Cloneable handle to one document's parser.
#[derive(Clone)]
pub struct PromptParser {
    inner: Arc<ParserInner>,
}

impl std::fmt::Debug for PromptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptParser")
            .field("id", &self.inner.id)
            .field("uri", &self.inner.document.uri().as_str())
            .field("state", &self.state())
            .finish()
    }
}

impl PromptParser {
    /// Creates an idle parser. Must be called inside a Tokio runtime.
    pub fn new(document: TextDocument, files: Arc<dyn FileService>) -> Self {
        let changes = document.subscribe();
        let (state, _) = watch::channel(ParserState::Idle);
        let (started, started_rx) = watch::channel(false);
        let (revision, _) = watch::channel(0);
        let cancel = CancellationToken::new();

        let inner = Arc::new(ParserInner {
            id: ParserId(NEXT_PARSER_ID.fetch_add(1, Ordering::Relaxed)),
            document,
            files,
            state,
            started,
            snapshot: Mutex::new(None),
            last_complete: Mutex::new(None),
            revision,
            cancel: cancel.clone(),
            on_dispose: Mutex::new(Vec::new()),
        });

        tokio::spawn(drive(Arc::downgrade(&inner), changes, started_rx, cancel));
        Self { inner }
    }

    pub fn id(&self) -> ParserId {
        self.inner.id
    }

    pub fn uri(&self) -> &Url {
        self.inner.document.uri()
    }

    pub fn document(&self) -> &TextDocument {
        &self.inner.document
    }

    /// Begins parsing. Calling it again has no effect.
    pub fn start(&self) -> &Self {
        self.inner.started.send_if_modified(|started| {
            let first = !*started;
            *started = true;
            first
        });
        self
    }

    pub fn state(&self) -> ParserState {
        *self.inner.state.borrow()
    }

    /// Waits until the current text has a settled parse.
    ///
    /// References may still be pending; see [`PromptParser::all_settled`].
    /// Fails if the parser is disposed first, or was never started.
    pub async fn settled(&self) -> Result<Arc<PromptNode>, ParserError> {
        self.wait(false).await
    }

    /// Like [`PromptParser::settled`], but also waits for every referenced
    /// document, transitively.
    pub async fn all_settled(&self) -> Result<Arc<PromptNode>, ParserError> {
        self.wait(true).await
    }

    async fn wait(&self, complete: bool) -> Result<Arc<PromptNode>, ParserError> {
        let mut state = self.inner.state.subscribe();
        loop {
            if self.is_disposed() || self.inner.document.is_disposed() {
                return Err(ParserError::Disposed);
            }
            if !*self.inner.started.borrow() {
                return Err(ParserError::NotStarted);
            }
            if let Some(node) = self.ready(complete) {
                return Ok(node);
            }
            if state.changed().await.is_err() {
                return Err(ParserError::Disposed);
            }
        }
    }

    fn ready(&self, complete: bool) -> Option<Arc<PromptNode>> {
        let snapshot = self.inner.snapshot.lock();
        let snapshot = snapshot.as_ref()?;
        let current = snapshot.version == self.inner.document.version();
        (current && (snapshot.complete || !complete)).then(|| Arc::clone(&snapshot.node))
    }

    /// The latest published parse, if any.
    pub fn snapshot(&self) -> Option<Arc<PromptNode>> {
        self.inner
            .snapshot
            .lock()
            .as_ref()
            .map(|s| Arc::clone(&s.node))
    }

    /// Top-level references of the latest parse.
    pub fn references(&self) -> Vec<Reference> {
        self.snapshot()
            .map(|node| node.references.clone())
            .unwrap_or_default()
    }

    /// Every reference of the latest parse, pre-order.
    pub fn all_references(&self) -> Vec<Reference> {
        self.snapshot()
            .map(|node| {
                node.references
                    .iter()
                    .flat_map(flatten)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn header(&self) -> Option<Header> {
        self.snapshot().map(|node| node.header.clone())
    }

    pub fn metadata(&self) -> Option<Metadata> {
        self.snapshot().map(|node| node.header.metadata.clone())
    }

    pub fn problems(&self) -> Vec<Diagnostic> {
        self.snapshot()
            .map(|node| node.problems())
            .unwrap_or_default()
    }

    /// Revision counter, bumped whenever a complete parse differs from the
    /// previous one.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == ParserState::Disposed
    }

    /// Registers a callback run once on disposal, immediately if the parser
    /// is already disposed.
    pub fn on_dispose(&self, callback: impl FnOnce() + Send + 'static) {
        let mut callbacks = self.inner.on_dispose.lock();
        if self.is_disposed() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(Box::new(callback));
        }
    }
}

impl ParserInner {
    fn dispose(&self) {
        let first = self.state.send_if_modified(|state| {
            if *state == ParserState::Disposed {
                return false;
            }
            *state = ParserState::Disposed;
            true
        });
        if !first {
            return;
        }

        log::debug!("disposing parser for {}", self.document.uri());
        self.cancel.cancel();
        let callbacks = std::mem::take(&mut *self.on_dispose.lock());
        for callback in callbacks {
            callback();
        }
    }

    async fn run_pass(&self, version: u64, text: String) {
        let uri = self.document.uri();
        self.state.send_replace(ParserState::Parsing { version });
        log::debug!("parsing {uri} at version {version}");

        let shallow = parse_shallow(uri, self.document.document_type(), &text);
        let complete = shallow.is_resolved();
        self.publish(version, shallow.clone(), complete);
        if complete {
            return;
        }

        let resolved = resolve_references(shallow, Arc::clone(&self.files), Vec::new()).await;
        self.publish(version, resolved, true);
    }

    fn publish(&self, version: u64, node: PromptNode, complete: bool) {
        if self.cancel.is_cancelled() {
            return;
        }
        let node = Arc::new(node);

        if complete {
            let mut last = self.last_complete.lock();
            if last.as_ref().is_none_or(|old| differs(old, &node)) {
                self.revision.send_modify(|revision| *revision += 1);
            }
            *last = Some(Arc::clone(&node));
        }

        *self.snapshot.lock() = Some(Snapshot {
            version,
            node,
            complete,
        });
        self.state
            .send_replace(ParserState::Settled { version, complete });
    }
}

/// Whether two parses differ in header or reference structure.
fn differs(old: &PromptNode, new: &PromptNode) -> bool {
    if old.header != new.header || old.references.len() != new.references.len() {
        return true;
    }
    old.references.iter().zip(&new.references).any(|(a, b)| {
        let (a_nodes, b_nodes) = (flatten(a), flatten(b));
        a_nodes.len() != b_nodes.len()
            || a_nodes.iter().zip(&b_nodes).any(|(x, y)| !same_reference(x, y))
            || difference(a, b, &same_reference).is_some()
    })
}

/// Compares one reference without looking into its subtree.
fn same_reference(a: &Reference, b: &Reference) -> bool {
    a.kind == b.kind
        && a.path == b.path
        && a.range == b.range
        && a.uri == b.uri
        && same_target(&a.target, &b.target)
}

fn same_target(a: &ReferenceTarget, b: &ReferenceTarget) -> bool {
    match (a, b) {
        (ReferenceTarget::Resolved(x), ReferenceTarget::Resolved(y)) => x.uri == y.uri,
        (ReferenceTarget::OpenFailed(x), ReferenceTarget::OpenFailed(y)) => x == y,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Runs passes until the parser or its document is disposed.
async fn drive(
    parser: Weak<ParserInner>,
    mut changes: watch::Receiver<DocumentState>,
    mut started: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        result = started.wait_for(|started| *started) => {
            if result.is_err() {
                return;
            }
        }
    }

    loop {
        let document = *changes.borrow_and_update();
        let Some(inner) = parser.upgrade() else {
            return;
        };
        if document.disposed {
            inner.dispose();
            return;
        }

        let (version, text) = inner.document.snapshot();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            changed = changes.changed() => {
                if changed.is_err() {
                    inner.dispose();
                    return;
                }
                log::debug!("version {version} superseded");
                continue;
            }
            () = inner.run_pass(version, text) => {}
        }
        drop(inner);

        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = changes.changed() => {
                if changed.is_err() {
                    if let Some(inner) = parser.upgrade() {
                        inner.dispose();
                    }
                    return;
                }
            }
        }
    }
}
