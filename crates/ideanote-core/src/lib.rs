//! IdeaNote Core Library
//!
//! State and filtering logic for a personal note-taking app:
//! - Data models (Note, Tag, Folder)
//! - An entity store with a live query and atomic transactions, backed by an
//!   Automerge document
//! - View derivation (filter by view, search and tag; pinned first, newest first)
//! - Mutation handlers, forms and validation
//! - Rich-text sanitizing, theme preference, keyboard shortcuts
//! - Configuration

pub mod config;
pub mod context;
pub mod error;
pub mod feedback;
pub mod forms;
pub mod models;
pub mod notebook;
pub mod sanitize;
pub mod shortcuts;
pub mod store;
pub mod theme;
pub mod view;

pub use config::Config;
pub use context::AppContext;
pub use error::{DocumentError, StoreError, StoreResult};
pub use feedback::SaveBanner;
pub use forms::{FolderForm, FolderPayload, NoteForm, NotePayload, ValidationError};
pub use models::{Folder, FolderColor, Note, NoteColor, Tag};
pub use notebook::Notebook;
pub use shortcuts::{
    default_shortcuts, Action, Dispatch, Focus, Key, KeyChord, KeyPress, Overlay, Overlays,
    ShortcutMap,
};
pub use store::{
    Collection, DocumentStore, EntityStore, LiveQuery, NoteDocument, Record, Snapshot,
    Transaction,
};
pub use theme::{Theme, ThemeStore};
pub use view::{derive, NoteCounts, ViewSelector, ViewState};
