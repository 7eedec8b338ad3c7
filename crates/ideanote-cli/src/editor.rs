//! Interactive editing support
//!
//! Opens $EDITOR on a small plain-text template for writing notes, and
//! converts between that template and the note's rich-text body.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

use ideanote_core::{sanitize, Note, NoteColor, NoteForm};

const SEPARATOR: &str = "---";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_dir = env::temp_dir();
    let temp_path = temp_dir.join(format!("ideanote_edit_{}.txt", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(&temp_path)
        .with_context(|| format!("Failed to read edited file: {:?}", temp_path))?;

    let _ = fs::remove_file(&temp_path);

    Ok(content)
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Render the editing template for a new or existing note
///
/// ```text
/// Title: Groceries
/// Tags: home, errands
/// Color: yellow
/// ---
/// Milk
/// Eggs
/// ```
pub fn note_template(note: Option<&Note>) -> String {
    let (title, tags, color, body) = match note {
        Some(note) => (
            note.title.clone().unwrap_or_default(),
            note.tags.join(", "),
            note.color.to_string(),
            sanitize::plain_text(&sanitize::sanitize_html(&note.text)),
        ),
        None => (String::new(), String::new(), String::new(), String::new()),
    };

    format!(
        "Title: {}\nTags: {}\nColor: {}\n{}\n{}\n",
        title, tags, color, SEPARATOR, body
    )
}

/// Parse an edited template into a note form
///
/// Without a `---` line the whole text is taken as the body.
pub fn parse_template(content: &str) -> Result<NoteForm> {
    let (header, body) = match content.split_once(&format!("\n{}\n", SEPARATOR)) {
        Some((header, body)) => (header, body),
        None => match content.strip_suffix(&format!("\n{}", SEPARATOR)) {
            Some(header) => (header, ""),
            None => ("", content),
        },
    };

    let mut form = NoteForm::new().with_text(text_to_html(body));

    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "title" => form = form.with_title(value),
            "tags" => {
                for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    if !form.selected_tags.iter().any(|t| t == tag) {
                        form.toggle_tag(tag);
                    }
                }
            }
            "color" if !value.is_empty() => {
                let color: NoteColor = value.parse()?;
                form.color = Some(color);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Convert plain text to paragraphs: blank lines split paragraphs, single
/// newlines become line breaks
pub fn text_to_html(text: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, html: &mut String| {
        if paragraph.is_empty() {
            return;
        }
        let escaped: Vec<String> = paragraph.iter().map(|l| escape(l)).collect();
        html.push_str("<p>");
        html.push_str(&escaped.join("<br>"));
        html.push_str("</p>");
        paragraph.clear();
    };

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut html);
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut html);

    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
