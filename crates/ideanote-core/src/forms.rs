//! Note and folder forms
//!
//! Forms hold the user's draft input and turn it into a payload for the
//! mutation layer. A payload can only be obtained through `submit`, so invalid
//! input never reaches the store.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Folder, FolderColor, Note, NoteColor};
use crate::sanitize;

/// Input rejected before any mutation is attempted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Note text cannot be empty")]
    EmptyNote,

    #[error("Folder name cannot be empty")]
    EmptyFolderName,
}

/// Validated note input
#[derive(Debug, Clone, PartialEq)]
pub struct NotePayload {
    text: String,
    title: Option<String>,
    tags: Vec<String>,
    color: Option<NoteColor>,
    folder_id: Option<Uuid>,
}

impl NotePayload {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Explicit color; `None` lets the notebook pick one
    pub fn color(&self) -> Option<NoteColor> {
        self.color
    }

    /// Folder a new note is filed into
    pub fn folder_id(&self) -> Option<Uuid> {
        self.folder_id
    }
}

/// Validated folder input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPayload {
    name: String,
    color: FolderColor,
}

impl FolderPayload {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> FolderColor {
        self.color
    }
}

/// Draft state of the create/edit note form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteForm {
    pub title: String,
    pub text: String,
    pub selected_tags: Vec<String>,
    /// Name typed into the "new tag" box
    pub new_tag: String,
    pub color: Option<NoteColor>,
    pub folder_id: Option<Uuid>,
}

impl NoteForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form prefilled from an existing note
    pub fn editing(note: &Note) -> Self {
        Self {
            title: note.title.clone().unwrap_or_default(),
            text: note.text.clone(),
            selected_tags: note.tags.clone(),
            new_tag: String::new(),
            color: Some(note.color),
            folder_id: note.folder_id,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_folder(mut self, folder_id: Option<Uuid>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Select or deselect a tag
    pub fn toggle_tag(&mut self, name: &str) {
        if let Some(pos) = self.selected_tags.iter().position(|t| t == name) {
            self.selected_tags.remove(pos);
        } else {
            self.selected_tags.push(name.to_string());
        }
    }

    /// Move the "new tag" box into the selection
    ///
    /// Returns the trimmed name, or `None` if the box was blank.
    pub fn add_new_tag(&mut self) -> Option<String> {
        let name = self.new_tag.trim().to_string();
        self.new_tag.clear();
        if name.is_empty() {
            return None;
        }
        if !self.selected_tags.contains(&name) {
            self.selected_tags.push(name.clone());
        }
        Some(name)
    }

    /// Validate the draft
    pub fn submit(&self) -> Result<NotePayload, ValidationError> {
        if sanitize::is_blank(&self.text) {
            return Err(ValidationError::EmptyNote);
        }

        let title = self.title.trim();
        let mut tags: Vec<String> = Vec::with_capacity(self.selected_tags.len());
        for tag in self.selected_tags.iter().map(|t| t.trim()) {
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        Ok(NotePayload {
            text: self.text.clone(),
            title: (!title.is_empty()).then(|| title.to_string()),
            tags,
            color: self.color,
            folder_id: self.folder_id,
        })
    }
}

/// Draft state of the create/edit folder form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderForm {
    pub name: String,
    pub color: FolderColor,
}

impl FolderForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing(folder: &Folder) -> Self {
        Self {
            name: folder.name.clone(),
            color: folder.color.unwrap_or_default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn submit(&self) -> Result<FolderPayload, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyFolderName);
        }
        Ok(FolderPayload {
            name: name.to_string(),
            color: self.color,
        })
    }
}
