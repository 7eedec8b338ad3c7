//! Entity store boundary
//!
//! The view layer consumes a store through two capabilities:
//!
//! - a live query that re-delivers the full `{ notes, tags, folders }`
//!   snapshot whenever any replica's mutation commits, and
//! - transaction submission taking a batch of create/update/delete operations
//!   keyed by entity id.
//!
//! Ids are minted client-side before a transaction is submitted so the caller
//! can reference a record before the commit is observed.
//!
//! [`DocumentStore`] is the provided implementation, backed by an Automerge
//! document.

mod document;
mod local;
mod persistence;

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Folder, FolderColor, Note, NoteColor, Tag};

pub use document::NoteDocument;
pub use local::DocumentStore;
pub use persistence::DocumentPersistence;
pub(crate) use persistence::atomic_write;

/// The three record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Notes,
    Tags,
    Folders,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Notes => "notes",
            Collection::Tags => "tags",
            Collection::Folders => "folders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every record in the store at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    /// Sorted by name
    pub tags: Vec<Tag>,
    /// Sorted by creation time
    pub folders: Vec<Folder>,
}

impl Snapshot {
    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn tag(&self, id: Uuid) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    pub fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// Tag names in display order
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}

/// State of the live query as seen by subscribers
#[derive(Debug, Clone, Default)]
pub enum LiveQuery {
    /// No snapshot delivered yet
    #[default]
    Loading,
    /// Latest committed state
    Ready(Arc<Snapshot>),
    /// The store could not serve the query
    Failed(String),
}

impl LiveQuery {
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            LiveQuery::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// A full record, used when creating
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Note(Note),
    Tag(Tag),
    Folder(Folder),
}

impl Record {
    pub fn id(&self) -> Uuid {
        match self {
            Record::Note(n) => n.id,
            Record::Tag(t) => t.id,
            Record::Folder(f) => f.id,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Record::Note(_) => Collection::Notes,
            Record::Tag(_) => Collection::Tags,
            Record::Folder(_) => Collection::Folders,
        }
    }
}

/// Field-level changes to a note; `None` leaves a field untouched
///
/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub text: Option<String>,
    pub title: Option<Option<String>>,
    pub color: Option<NoteColor>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_favorite: Option<bool>,
    pub folder_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPatch {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub color: Option<Option<FolderColor>>,
}

/// Field-level changes for one record
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Note(NotePatch),
    Tag(TagPatch),
    Folder(FolderPatch),
}

impl Patch {
    pub fn collection(&self) -> Collection {
        match self {
            Patch::Note(_) => Collection::Notes,
            Patch::Tag(_) => Collection::Tags,
            Patch::Folder(_) => Collection::Folders,
        }
    }
}

/// One operation in a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Create(Record),
    Update { id: Uuid, patch: Patch },
    Delete { collection: Collection, id: Uuid },
}

impl Op {
    pub fn collection(&self) -> Collection {
        match self {
            Op::Create(record) => record.collection(),
            Op::Update { patch, .. } => patch.collection(),
            Op::Delete { collection, .. } => *collection,
        }
    }
}

/// A batch of operations committed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    ops: Vec<Op>,
    message: Option<String>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the change (stored as the commit message)
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn create(mut self, record: Record) -> Self {
        self.ops.push(Op::Create(record));
        self
    }

    pub fn update(mut self, id: Uuid, patch: Patch) -> Self {
        self.ops.push(Op::Update { id, patch });
        self
    }

    pub fn delete(mut self, collection: Collection, id: Uuid) -> Self {
        self.ops.push(Op::Delete { collection, id });
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A reactive, transactional store of notes, tags and folders
pub trait EntityStore {
    /// Subscribe to the live query
    ///
    /// The receiver observes a new value after every commit, local or merged
    /// from another replica.
    fn subscribe(&self) -> watch::Receiver<LiveQuery>;

    /// The latest committed snapshot
    fn snapshot(&self) -> StoreResult<Arc<Snapshot>>;

    /// Apply a batch of operations atomically
    ///
    /// Either every operation commits or none does.
    fn transact(&mut self, tx: Transaction) -> StoreResult<()>;
}
