//! Data models for IdeaNote
//!
//! Defines the three record types held by the entity store: Note, Tag and
//! Folder, plus the fixed color palettes used to label them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Background color of a note card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    Coral,
    #[default]
    White,
    Blue,
    Pink,
    Gray,
    Yellow,
    Green,
    Peach,
    Lavender,
    Mint,
}

impl NoteColor {
    /// Every note color, in picker order
    pub const ALL: [NoteColor; 10] = [
        NoteColor::Coral,
        NoteColor::White,
        NoteColor::Blue,
        NoteColor::Pink,
        NoteColor::Gray,
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Peach,
        NoteColor::Lavender,
        NoteColor::Mint,
    ];

    /// Stable name used in storage
    pub fn as_str(self) -> &'static str {
        match self {
            NoteColor::Coral => "coral",
            NoteColor::White => "white",
            NoteColor::Blue => "blue",
            NoteColor::Pink => "pink",
            NoteColor::Gray => "gray",
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Peach => "peach",
            NoteColor::Lavender => "lavender",
            NoteColor::Mint => "mint",
        }
    }

    /// Light-theme hex value
    pub fn hex(self) -> &'static str {
        match self {
            NoteColor::Coral => "#FF9999",
            NoteColor::White => "#F5F5F5",
            NoteColor::Blue => "#A8D8FF",
            NoteColor::Pink => "#E8D5F0",
            NoteColor::Gray => "#D4E4F7",
            NoteColor::Yellow => "#FFE5B4",
            NoteColor::Green => "#B4E7B4",
            NoteColor::Peach => "#FFCC99",
            NoteColor::Lavender => "#E6D7FF",
            NoteColor::Mint => "#D4F0E8",
        }
    }

    /// RGB components of [`NoteColor::hex`]
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Pick a color from a seed byte (new notes without an explicit color)
    pub fn from_seed(seed: u8) -> Self {
        Self::ALL[seed as usize % Self::ALL.len()]
    }

    /// The next color in picker order, wrapping
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older documents stored the CSS class name
        let name = s.trim().trim_start_matches("note-").to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// Accent color of a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Gray,
}

impl FolderColor {
    /// Every folder color, in picker order
    pub const ALL: [FolderColor; 6] = [
        FolderColor::Blue,
        FolderColor::Green,
        FolderColor::Purple,
        FolderColor::Orange,
        FolderColor::Pink,
        FolderColor::Gray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FolderColor::Blue => "blue",
            FolderColor::Green => "green",
            FolderColor::Purple => "purple",
            FolderColor::Orange => "orange",
            FolderColor::Pink => "pink",
            FolderColor::Gray => "gray",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for FolderColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// A color name that is not part of the palette
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color: {0}")]
pub struct UnknownColor(pub String);

/// A short rich-text note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// Unique identifier, minted client-side
    pub id: Uuid,
    /// Body as a constrained HTML fragment
    pub text: String,
    /// Optional title
    pub title: Option<String>,
    /// Card color
    pub color: NoteColor,
    /// When this note was created
    pub created_at: DateTime<Utc>,
    /// Tag names (order irrelevant, no duplicates)
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_favorite: bool,
    /// Folder this note is filed under (weak reference)
    pub folder_id: Option<Uuid>,
}

impl Note {
    /// Create a new note with the given body text
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), text)
    }

    /// Create a note with a specific ID (for loading from storage)
    pub fn with_id(id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            title: None,
            color: NoteColor::from_seed(id.as_bytes()[0]),
            created_at: Utc::now(),
            tags: Vec::new(),
            is_pinned: false,
            is_favorite: false,
            folder_id: None,
        }
    }

    /// Whether this note carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.has_tag(&tag) {
            self.tags.push(tag);
        }
    }

    /// Remove a tag
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Title if set, otherwise the first line of the body
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => crate::sanitize::plain_text(&self.text)
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("")
                .to_string(),
        }
    }
}

/// A tag in the global tag set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A folder grouping notes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub color: Option<FolderColor>,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: None,
            created_at: Utc::now(),
        }
    }

    /// Color used for display; folders without one show as gray
    pub fn display_color(&self) -> FolderColor {
        self.color.unwrap_or(FolderColor::Gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_new() {
        let note = Note::new("<p>hello</p>");
        assert_eq!(note.text, "<p>hello</p>");
        assert!(note.title.is_none());
        assert!(note.tags.is_empty());
        assert!(!note.is_pinned);
        assert!(!note.is_favorite);
        assert!(note.folder_id.is_none());
    }

    #[test]
    fn test_note_color_follows_id() {
        let id = Uuid::new_v4();
        let note = Note::with_id(id, "text");
        assert_eq!(note.color, NoteColor::from_seed(id.as_bytes()[0]));
    }

    #[test]
    fn test_note_tags() {
        let mut note = Note::new("text");
        note.add_tag("idea");
        note.add_tag("work");
        note.add_tag("idea");
        assert_eq!(note.tags, vec!["idea", "work"]);
        assert!(note.has_tag("work"));

        note.remove_tag("idea");
        assert_eq!(note.tags, vec!["work"]);
    }

    #[test]
    fn test_display_title() {
        let mut note = Note::new("<p>first line</p><p>second</p>");
        assert_eq!(note.display_title(), "first line");

        note.title = Some("Groceries".to_string());
        assert_eq!(note.display_title(), "Groceries");

        note.title = Some("   ".to_string());
        assert_eq!(note.display_title(), "first line");
    }

    #[test]
    fn test_note_color_parse() {
        assert_eq!("coral".parse::<NoteColor>().unwrap(), NoteColor::Coral);
        assert_eq!("note-mint".parse::<NoteColor>().unwrap(), NoteColor::Mint);
        assert_eq!("Lavender".parse::<NoteColor>().unwrap(), NoteColor::Lavender);
        assert!("magenta".parse::<NoteColor>().is_err());
    }

    #[test]
    fn test_note_color_rgb() {
        assert_eq!(NoteColor::Coral.rgb(), (0xFF, 0x99, 0x99));
        assert_eq!(NoteColor::Mint.rgb(), (0xD4, 0xF0, 0xE8));
    }

    #[test]
    fn test_color_next_wraps() {
        assert_eq!(NoteColor::Mint.next(), NoteColor::Coral);
        assert_eq!(FolderColor::Gray.next(), FolderColor::Blue);
    }

    #[test]
    fn test_folder_display_color() {
        let mut folder = Folder::new("Work");
        assert_eq!(folder.display_color(), FolderColor::Gray);
        folder.color = Some(FolderColor::Purple);
        assert_eq!(folder.display_color(), FolderColor::Purple);
    }

    #[test]
    fn test_note_serialization() {
        let mut note = Note::new("<p>Content</p>");
        note.add_tag("test");
        note.folder_id = Some(Uuid::new_v4());
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"is_pinned\":false"));
        let deserialized: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note, deserialized);
    }
}
