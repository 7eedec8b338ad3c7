//! Local document store
//!
//! The `DocumentStore` owns the Automerge document and coordinates:
//! - transaction application (all-or-nothing)
//! - persistence to disk after every commit
//! - the live query, republished after every local commit or merge
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = DocumentStore::open(&config)?;
//! let mut updates = store.subscribe();
//!
//! store.transact(Transaction::new().create(Record::Note(note)))?;
//! // `updates` now observes a snapshot containing the note
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::persistence::{load_document, DocumentPersistence};
use super::{EntityStore, LiveQuery, NoteDocument, Snapshot, Transaction};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};

/// Entity store backed by a local Automerge document
pub struct DocumentStore {
    doc: NoteDocument,
    /// `None` for in-memory stores
    persistence: Option<DocumentPersistence>,
    updates: watch::Sender<LiveQuery>,
}

impl DocumentStore {
    /// Open the store at the configured document path, creating it if needed
    pub fn open(config: &Config) -> StoreResult<Self> {
        Self::open_at(config.document_path())
    }

    /// Open the store at a specific path
    pub fn open_at(path: impl AsRef<Path>) -> StoreResult<Self> {
        let persistence = DocumentPersistence::new(path.as_ref());
        let doc = persistence.load_or_create()?;
        info!("Opened note document at {:?}", persistence.path());
        Ok(Self::from_parts(doc, Some(persistence)))
    }

    /// A store that lives only in memory
    pub fn in_memory() -> Self {
        Self::from_parts(NoteDocument::new(), None)
    }

    /// Wrap an existing document without persistence
    pub fn from_document(doc: NoteDocument) -> Self {
        Self::from_parts(doc, None)
    }

    fn from_parts(doc: NoteDocument, persistence: Option<DocumentPersistence>) -> Self {
        let (updates, _) = watch::channel(LiveQuery::Loading);
        let store = Self {
            doc,
            persistence,
            updates,
        };
        store.publish();
        store
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.path())
    }

    /// A second replica sharing this store's history
    pub fn fork(&mut self) -> NoteDocument {
        self.doc.fork()
    }

    /// Merge another replica's changes into this store
    ///
    /// Returns true if anything changed. Subscribers are notified and the
    /// merged document is saved.
    pub fn merge(&mut self, other: &mut NoteDocument) -> StoreResult<bool> {
        let changed = self.doc.merge(other)?;
        if changed {
            info!("Merged remote changes");
            self.persist()?;
            self.publish();
        } else {
            debug!("Merge brought no new changes");
        }
        Ok(changed)
    }

    /// Merge a document file written by another device
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> StoreResult<bool> {
        let path = path.as_ref();
        let mut other = load_document(path)?.ok_or_else(|| StoreError::ReadError {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such document"),
        })?;
        self.merge(&mut other)
    }

    /// Re-read the document and push the result to subscribers
    fn publish(&self) {
        let value = match self.doc.snapshot() {
            Ok(snapshot) => {
                debug!(
                    "Publishing snapshot: {} notes, {} tags, {} folders",
                    snapshot.notes.len(),
                    snapshot.tags.len(),
                    snapshot.folders.len()
                );
                LiveQuery::Ready(Arc::new(snapshot))
            }
            Err(e) => {
                warn!("Failed to read document: {}", e);
                LiveQuery::Failed(e.to_string())
            }
        };
        self.updates.send_replace(value);
    }

    fn persist(&mut self) -> StoreResult<()> {
        if let Some(persistence) = &self.persistence {
            persistence.save(&mut self.doc)?;
        }
        Ok(())
    }
}

impl EntityStore for DocumentStore {
    fn subscribe(&self) -> watch::Receiver<LiveQuery> {
        self.updates.subscribe()
    }

    fn snapshot(&self) -> StoreResult<Arc<Snapshot>> {
        match &*self.updates.borrow() {
            LiveQuery::Ready(snapshot) => Ok(Arc::clone(snapshot)),
            LiveQuery::Failed(message) => Err(StoreError::Unavailable(message.clone())),
            LiveQuery::Loading => Err(StoreError::Unavailable("still loading".to_string())),
        }
    }

    fn transact(&mut self, tx: Transaction) -> StoreResult<()> {
        if tx.is_empty() {
            return Ok(());
        }

        for op in tx.ops() {
            if let Err(e) = self.doc.apply(op) {
                let dropped = self.doc.rollback();
                warn!(
                    "Transaction rolled back ({} pending ops discarded): {}",
                    dropped, e
                );
                return Err(e);
            }
        }

        self.doc.commit(tx.message());
        debug!(
            "Committed {} ops: {}",
            tx.len(),
            tx.message().unwrap_or("(no message)")
        );

        // Saved before publishing: subscribers never see an unsaved commit.
        // After a failed save the change stays in memory and goes out with
        // the next successful commit.
        self.persist()?;
        self.publish();
        Ok(())
    }
}
