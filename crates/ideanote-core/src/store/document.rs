//! Automerge document handling
//!
//! Maps notes, tags and folders onto an Automerge document and applies
//! transaction operations to it. Every record is a map keyed by its id inside
//! one of three top-level maps, and every field is written individually so
//! concurrent edits to different fields of the same record merge cleanly.

use std::fmt;

use automerge::transaction::{CommitOptions, Transactable};
use automerge::{ActorId, AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::{Collection, FolderPatch, NotePatch, Op, Patch, Record, Snapshot, TagPatch};
use crate::error::{DocumentError, StoreError, StoreResult};
use crate::models::{Folder, Note, NoteColor, Tag};

/// Keys used in the Automerge document structure
mod keys {
    pub const NOTES: &str = "notes";
    pub const TAGS: &str = "tags";
    pub const FOLDERS: &str = "folders";
    pub const SCHEMA_VERSION: &str = "schema_version";

    // Record fields
    pub const ID: &str = "id";
    pub const TEXT: &str = "text";
    pub const TITLE: &str = "title";
    pub const COLOR: &str = "color";
    pub const CREATED_AT: &str = "created_at";
    pub const NOTE_TAGS: &str = "tags";
    pub const IS_PINNED: &str = "is_pinned";
    pub const IS_FAVORITE: &str = "is_favorite";
    pub const FOLDER_ID: &str = "folder_id";
    pub const NAME: &str = "name";
}

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// Actor that writes the initial document structure
///
/// Every replica creates the same first change (same actor, time and ops), so
/// documents created independently on two devices share their root maps and
/// can be merged.
const GENESIS_ACTOR: [u8; 16] = [0; 16];

/// A notes document backed by Automerge
pub struct NoteDocument {
    doc: AutoCommit,
}

impl fmt::Debug for NoteDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteDocument")
            .field("actor", self.doc.get_actor())
            .finish_non_exhaustive()
    }
}

impl NoteDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        let mut doc = AutoCommit::new().with_actor(ActorId::from(GENESIS_ACTOR));

        // Initialize document structure
        doc.put(ROOT, keys::SCHEMA_VERSION, CURRENT_SCHEMA_VERSION)
            .expect("Failed to set schema version");
        doc.put_object(ROOT, keys::NOTES, ObjType::Map)
            .expect("Failed to create notes map");
        doc.put_object(ROOT, keys::TAGS, ObjType::Map)
            .expect("Failed to create tags map");
        doc.put_object(ROOT, keys::FOLDERS, ObjType::Map)
            .expect("Failed to create folders map");
        doc.commit_with(CommitOptions::default().with_time(0));

        doc.set_actor(ActorId::random());
        Self { doc }
    }

    /// Load a document from Automerge bytes
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc = AutoCommit::load(bytes)?;
        let document = Self { doc };

        // Make sure the structure is there before handing it out
        for collection in [Collection::Notes, Collection::Tags, Collection::Folders] {
            document.collection_id(collection)?;
        }
        Ok(document)
    }

    /// Save the document to bytes
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Fork the document (a second replica of the same history)
    pub fn fork(&mut self) -> Self {
        Self {
            doc: self.doc.fork(),
        }
    }

    /// Merge another replica into this one
    ///
    /// Returns true if any new changes were applied.
    pub fn merge(&mut self, other: &mut NoteDocument) -> Result<bool, DocumentError> {
        let before = self.doc.get_heads();
        self.doc.merge(&mut other.doc)?;
        Ok(self.doc.get_heads() != before)
    }

    /// Schema version recorded in the document
    pub fn schema_version(&self) -> Result<u64, DocumentError> {
        match self.doc.get(ROOT, keys::SCHEMA_VERSION)? {
            Some((value, _)) => value
                .to_u64()
                .ok_or_else(|| DocumentError::InvalidType(keys::SCHEMA_VERSION.to_string())),
            None => Err(DocumentError::MissingField(keys::SCHEMA_VERSION.to_string())),
        }
    }

    // ==================== Transactions ====================

    /// Apply one operation to the pending change
    pub fn apply(&mut self, op: &Op) -> StoreResult<()> {
        match op {
            Op::Create(record) => self.create(record),
            Op::Update { id, patch } => self.update(*id, patch),
            Op::Delete { collection, id } => self.delete(*collection, *id),
        }
    }

    /// Commit the pending change
    pub fn commit(&mut self, message: Option<&str>) {
        let mut options = CommitOptions::default();
        if let Some(message) = message {
            options.set_message(message);
        }
        self.doc.commit_with(options);
    }

    /// Discard the pending change, returning the number of operations dropped
    pub fn rollback(&mut self) -> usize {
        self.doc.rollback()
    }

    fn create(&mut self, record: &Record) -> StoreResult<()> {
        let collection = record.collection();
        let map = self.collection_id(collection)?;
        let key = record.id().to_string();

        if self.doc.get(&map, key.as_str())?.is_some() {
            return Err(StoreError::AlreadyExists {
                collection,
                id: record.id(),
            });
        }

        let obj = self.doc.put_object(&map, key.as_str(), ObjType::Map)?;
        match record {
            Record::Note(note) => self.write_note_fields(&obj, note),
            Record::Tag(tag) => self.write_tag_fields(&obj, tag),
            Record::Folder(folder) => self.write_folder_fields(&obj, folder),
        }
    }

    fn update(&mut self, id: Uuid, patch: &Patch) -> StoreResult<()> {
        let collection = patch.collection();
        let obj = self
            .record_id(collection, id)?
            .ok_or(StoreError::NotFound { collection, id })?;

        match patch {
            Patch::Note(patch) => self.write_note_patch(&obj, patch),
            Patch::Tag(patch) => self.write_tag_patch(&obj, patch),
            Patch::Folder(patch) => self.write_folder_patch(&obj, patch),
        }
    }

    fn delete(&mut self, collection: Collection, id: Uuid) -> StoreResult<()> {
        let map = self.collection_id(collection)?;
        if self.doc.get(&map, id.to_string())?.is_none() {
            return Err(StoreError::NotFound { collection, id });
        }
        self.doc.delete(&map, id.to_string())?;
        Ok(())
    }

    // ==================== Queries ====================

    /// Read every record into a snapshot
    pub fn snapshot(&self) -> Result<Snapshot, DocumentError> {
        let mut notes = self.read_all(Collection::Notes, |doc, obj, id| doc.read_note(obj, id))?;
        let mut tags = self.read_all(Collection::Tags, |doc, obj, id| doc.read_tag(obj, id))?;
        let mut folders =
            self.read_all(Collection::Folders, |doc, obj, id| doc.read_folder(obj, id))?;

        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        folders.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(Snapshot {
            notes,
            tags,
            folders,
        })
    }

    /// Get a note by ID
    pub fn get_note(&self, id: Uuid) -> Result<Option<Note>, DocumentError> {
        match self.record_id(Collection::Notes, id)? {
            Some(obj) => Ok(Some(self.read_note(&obj, id)?)),
            None => Ok(None),
        }
    }

    fn read_all<T>(
        &self,
        collection: Collection,
        read: impl Fn(&Self, &ObjId, Uuid) -> Result<T, DocumentError>,
    ) -> Result<Vec<T>, DocumentError> {
        let map = self.collection_id(collection)?;

        let mut records = Vec::new();
        for key in self.doc.keys(&map) {
            let id = Uuid::parse_str(&key).map_err(|_| DocumentError::InvalidUuid(key.clone()))?;
            if let Some((_, obj)) = self.doc.get(&map, key.as_str())? {
                records.push(read(self, &obj, id)?);
            }
        }
        Ok(records)
    }

    // ==================== Private helpers ====================

    fn collection_id(&self, collection: Collection) -> Result<ObjId, DocumentError> {
        self.doc
            .get(ROOT, collection.as_str())?
            .map(|(_, id)| id)
            .ok_or_else(|| DocumentError::MissingField(collection.as_str().to_string()))
    }

    fn record_id(&self, collection: Collection, id: Uuid) -> Result<Option<ObjId>, DocumentError> {
        let map = self.collection_id(collection)?;
        Ok(self.doc.get(&map, id.to_string())?.map(|(_, obj)| obj))
    }

    fn write_note_fields(&mut self, obj: &ObjId, note: &Note) -> StoreResult<()> {
        self.doc.put(obj, keys::ID, note.id.to_string())?;
        self.doc
            .put(obj, keys::CREATED_AT, note.created_at.timestamp_millis())?;
        self.write_note_patch(
            obj,
            &NotePatch {
                text: Some(note.text.clone()),
                title: Some(note.title.clone()),
                color: Some(note.color),
                tags: Some(note.tags.clone()),
                is_pinned: Some(note.is_pinned),
                is_favorite: Some(note.is_favorite),
                folder_id: Some(note.folder_id),
            },
        )
    }

    fn write_note_patch(&mut self, obj: &ObjId, patch: &NotePatch) -> StoreResult<()> {
        if let Some(text) = &patch.text {
            self.doc.put(obj, keys::TEXT, text.as_str())?;
        }
        if let Some(title) = &patch.title {
            self.put_optional(obj, keys::TITLE, title.as_deref())?;
        }
        if let Some(color) = patch.color {
            self.doc.put(obj, keys::COLOR, color.as_str())?;
        }
        if let Some(tags) = &patch.tags {
            let list = self.doc.put_object(obj, keys::NOTE_TAGS, ObjType::List)?;
            let mut written: Vec<&str> = Vec::with_capacity(tags.len());
            for tag in tags {
                if written.contains(&tag.as_str()) {
                    continue;
                }
                self.doc.insert(&list, written.len(), tag.as_str())?;
                written.push(tag);
            }
        }
        if let Some(pinned) = patch.is_pinned {
            self.doc.put(obj, keys::IS_PINNED, pinned)?;
        }
        if let Some(favorite) = patch.is_favorite {
            self.doc.put(obj, keys::IS_FAVORITE, favorite)?;
        }
        if let Some(folder_id) = &patch.folder_id {
            let folder_id = folder_id.map(|id| id.to_string());
            self.put_optional(obj, keys::FOLDER_ID, folder_id.as_deref())?;
        }
        Ok(())
    }

    fn write_tag_fields(&mut self, obj: &ObjId, tag: &Tag) -> StoreResult<()> {
        self.doc.put(obj, keys::ID, tag.id.to_string())?;
        self.write_tag_patch(
            obj,
            &TagPatch {
                name: Some(tag.name.clone()),
            },
        )
    }

    fn write_tag_patch(&mut self, obj: &ObjId, patch: &TagPatch) -> StoreResult<()> {
        if let Some(name) = &patch.name {
            self.doc.put(obj, keys::NAME, name.as_str())?;
        }
        Ok(())
    }

    fn write_folder_fields(&mut self, obj: &ObjId, folder: &Folder) -> StoreResult<()> {
        self.doc.put(obj, keys::ID, folder.id.to_string())?;
        self.doc
            .put(obj, keys::CREATED_AT, folder.created_at.timestamp_millis())?;
        self.write_folder_patch(
            obj,
            &FolderPatch {
                name: Some(folder.name.clone()),
                color: Some(folder.color),
            },
        )
    }

    fn write_folder_patch(&mut self, obj: &ObjId, patch: &FolderPatch) -> StoreResult<()> {
        if let Some(name) = &patch.name {
            self.doc.put(obj, keys::NAME, name.as_str())?;
        }
        if let Some(color) = &patch.color {
            self.put_optional(obj, keys::COLOR, color.map(|c| c.as_str()))?;
        }
        Ok(())
    }

    /// Write a nullable field; `None` removes the key
    fn put_optional(&mut self, obj: &ObjId, key: &str, value: Option<&str>) -> StoreResult<()> {
        match value {
            Some(value) => {
                self.doc.put(obj, key, value)?;
            }
            None => {
                if self.doc.get(obj, key)?.is_some() {
                    self.doc.delete(obj, key)?;
                }
            }
        }
        Ok(())
    }

    fn read_note(&self, obj: &ObjId, id: Uuid) -> Result<Note, DocumentError> {
        let text = self.get_string(obj, keys::TEXT)?;
        let title = self.get_optional_string(obj, keys::TITLE)?;
        let color = self
            .get_optional_string(obj, keys::COLOR)?
            .and_then(|c| c.parse::<NoteColor>().ok())
            .unwrap_or_default();
        let created_at = self.get_timestamp(obj, keys::CREATED_AT)?;
        let tags = self.get_string_list(obj, keys::NOTE_TAGS)?;
        let is_pinned = self.get_bool(obj, keys::IS_PINNED)?;
        let is_favorite = self.get_bool(obj, keys::IS_FAVORITE)?;
        let folder_id = self.get_optional_uuid(obj, keys::FOLDER_ID)?;

        Ok(Note {
            id,
            text,
            title,
            color,
            created_at,
            tags,
            is_pinned,
            is_favorite,
            folder_id,
        })
    }

    fn read_tag(&self, obj: &ObjId, id: Uuid) -> Result<Tag, DocumentError> {
        let name = self.get_string(obj, keys::NAME)?;
        Ok(Tag { id, name })
    }

    fn read_folder(&self, obj: &ObjId, id: Uuid) -> Result<Folder, DocumentError> {
        let name = self.get_string(obj, keys::NAME)?;
        let color = self
            .get_optional_string(obj, keys::COLOR)?
            .and_then(|c| c.parse().ok());
        let created_at = self.get_timestamp(obj, keys::CREATED_AT)?;

        Ok(Folder {
            id,
            name,
            color,
            created_at,
        })
    }

    fn get_string(&self, obj: &ObjId, key: &str) -> Result<String, DocumentError> {
        match self.doc.get(obj, key)? {
            Some((value, _)) => value
                .to_str()
                .map(|s| s.to_string())
                .ok_or_else(|| DocumentError::InvalidType(key.to_string())),
            None => Err(DocumentError::MissingField(key.to_string())),
        }
    }

    fn get_optional_string(&self, obj: &ObjId, key: &str) -> Result<Option<String>, DocumentError> {
        match self.doc.get(obj, key)? {
            Some((value, _)) => Ok(value.to_str().map(|s| s.to_string())),
            None => Ok(None),
        }
    }

    fn get_optional_uuid(&self, obj: &ObjId, key: &str) -> Result<Option<Uuid>, DocumentError> {
        match self.get_optional_string(obj, key)? {
            Some(raw) => Uuid::parse_str(&raw)
                .map(Some)
                .map_err(|_| DocumentError::InvalidUuid(raw)),
            None => Ok(None),
        }
    }

    /// Missing flags read as false (notes written before the flag existed)
    fn get_bool(&self, obj: &ObjId, key: &str) -> Result<bool, DocumentError> {
        match self.doc.get(obj, key)? {
            Some((Value::Scalar(scalar), _)) => match scalar.as_ref() {
                ScalarValue::Boolean(b) => Ok(*b),
                _ => Err(DocumentError::InvalidType(key.to_string())),
            },
            Some(_) => Err(DocumentError::InvalidType(key.to_string())),
            None => Ok(false),
        }
    }

    fn get_string_list(&self, obj: &ObjId, key: &str) -> Result<Vec<String>, DocumentError> {
        match self.doc.get(obj, key)? {
            Some((_, list_id)) => {
                let mut result = Vec::new();
                let len = self.doc.length(&list_id);
                for i in 0..len {
                    if let Some((value, _)) = self.doc.get(&list_id, i)? {
                        if let Some(s) = value.to_str() {
                            result.push(s.to_string());
                        }
                    }
                }
                Ok(result)
            }
            None => Ok(Vec::new()),
        }
    }

    fn get_timestamp(&self, obj: &ObjId, key: &str) -> Result<DateTime<Utc>, DocumentError> {
        match self.doc.get(obj, key)? {
            Some((value, _)) => {
                let millis = value
                    .to_i64()
                    .ok_or_else(|| DocumentError::InvalidType(key.to_string()))?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or(DocumentError::InvalidTimestamp(millis))
            }
            None => Err(DocumentError::MissingField(key.to_string())),
        }
    }
}

impl Default for NoteDocument {
    fn default() -> Self {
        Self::new()
    }
}
