//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use ideanote_core::sanitize;
use ideanote_core::{Folder, Note, NoteCounts, Snapshot, Tag};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single note in full
    pub fn print_note(&self, note: &Note, snapshot: &Snapshot) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", note.id);
                if let Some(ref title) = note.title {
                    println!("Title:    {}", title);
                }
                println!("Color:    {}", note.color);
                if !note.tags.is_empty() {
                    println!("Tags:     {}", note.tags.join(", "));
                }
                println!("Folder:   {}", folder_label(note, snapshot));
                println!("Flags:    {}", flags(note).trim());
                println!("Created:  {}", note.created_at.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", sanitize::plain_text(&sanitize::sanitize_html(&note.text)));
            }
            OutputFormat::Json => {
                println!("{}", to_json(note));
            }
            OutputFormat::Quiet => {
                println!("{}", note.id);
            }
        }
    }

    /// Print a derived note list
    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return;
                }
                for note in notes {
                    let tags = if note.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" #{}", note.tags.join(" #"))
                    };
                    println!(
                        "{} |{}| {}{}",
                        short_id(&note.id),
                        flags(note),
                        truncate(&note.display_title(), 50),
                        tags
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(notes));
            }
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
    }

    /// Print the tag set with usage counts
    pub fn print_tags(&self, tags: &[Tag], notes: &[Note]) {
        let counted: Vec<(&Tag, usize)> = tags
            .iter()
            .map(|t| (t, notes.iter().filter(|n| n.has_tag(&t.name)).count()))
            .collect();

        match self.format {
            OutputFormat::Human => {
                if counted.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (tag, count) in &counted {
                    println!("{} ({})", tag.name, count);
                }
                println!("\n{} tag(s)", counted.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = counted
                    .iter()
                    .map(|(tag, count)| {
                        serde_json::json!({"id": tag.id, "name": tag.name, "count": count})
                    })
                    .collect();
                println!("{}", to_json(&json_tags));
            }
            OutputFormat::Quiet => {
                for (tag, _) in &counted {
                    println!("{}", tag.name);
                }
            }
        }
    }

    /// Print folders with note counts
    pub fn print_folders(&self, folders: &[Folder], counts: &NoteCounts) {
        match self.format {
            OutputFormat::Human => {
                if folders.is_empty() {
                    println!("No folders. Create one with `ideanote folder add <name>`.");
                    return;
                }
                for folder in folders {
                    println!(
                        "{} | {:<24} | {:<6} | {}",
                        short_id(&folder.id),
                        truncate(&folder.name, 24),
                        folder.display_color(),
                        counts.by_folder.get(&folder.id).copied().unwrap_or(0)
                    );
                }
                println!("\n{} folder(s)", folders.len());
            }
            OutputFormat::Json => {
                let json_folders: Vec<_> = folders
                    .iter()
                    .map(|f| {
                        serde_json::json!({
                            "id": f.id,
                            "name": f.name,
                            "color": f.color,
                            "created_at": f.created_at,
                            "count": counts.by_folder.get(&f.id).copied().unwrap_or(0),
                        })
                    })
                    .collect();
                println!("{}", to_json(&json_folders));
            }
            OutputFormat::Quiet => {
                for folder in folders {
                    println!("{}", folder.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// First 8 characters of an id
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Pin/favorite markers, fixed width
fn flags(note: &Note) -> String {
    format!(
        "{}{}",
        if note.is_pinned { "📌" } else { "  " },
        if note.is_favorite { "★" } else { " " }
    )
}

fn folder_label(note: &Note, snapshot: &Snapshot) -> String {
    match note.folder_id {
        Some(id) => snapshot
            .folder(id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "(missing folder)".to_string()),
        None => "(uncategorized)".to_string(),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé text here", 8), "ünïcö...");
    }

    #[test]
    fn test_folder_label() {
        let folder = Folder::new("Work");
        let mut note = Note::new("x");
        let snapshot = Snapshot {
            notes: vec![],
            tags: vec![],
            folders: vec![folder.clone()],
        };

        assert_eq!(folder_label(&note, &snapshot), "(uncategorized)");
        note.folder_id = Some(folder.id);
        assert_eq!(folder_label(&note, &snapshot), "Work");
        note.folder_id = Some(uuid::Uuid::new_v4());
        assert_eq!(folder_label(&note, &snapshot), "(missing folder)");
    }

    #[test]
    fn test_flags() {
        let mut note = Note::new("x");
        assert_eq!(flags(&note), "   ");
        note.is_favorite = true;
        assert_eq!(flags(&note), "  ★");
    }
}
