//! Automerge document persistence
//!
//! Saves and loads the notes document to/from a single file. Writes go to a
//! temp file that is synced and then renamed over the target, so the file on
//! disk is never left half-written.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::NoteDocument;
use crate::error::{StoreError, StoreResult};

/// File-backed persistence for a [`NoteDocument`]
#[derive(Debug, Clone)]
pub struct DocumentPersistence {
    path: PathBuf,
}

impl DocumentPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a document exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Save a document to disk using atomic write
    pub fn save(&self, doc: &mut NoteDocument) -> StoreResult<()> {
        let bytes = doc.save();
        atomic_write(&self.path, &bytes)
    }

    /// Load a document from disk
    ///
    /// Returns `None` if the file doesn't exist.
    pub fn load(&self) -> StoreResult<Option<NoteDocument>> {
        load_document(&self.path)
    }

    /// Load the existing document or create and save a new one
    pub fn load_or_create(&self) -> StoreResult<NoteDocument> {
        if let Some(doc) = self.load()? {
            return Ok(doc);
        }

        let mut doc = NoteDocument::new();
        self.save(&mut doc)?;
        Ok(doc)
    }
}

/// Read and parse a document file
pub(crate) fn load_document(path: &Path) -> StoreResult<Option<NoteDocument>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(StoreError::from_io(e, path.to_path_buf()))
        }
        Err(source) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    NoteDocument::load(&bytes)
        .map(Some)
        .map_err(|e| StoreError::CorruptDocument {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    let io_err = |e: io::Error| StoreError::from_io(e, path.to_path_buf());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(io_err)?;
    file.write_all(data).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    fs::rename(&temp_path, path).map_err(io_err)?;

    Ok(())
}
