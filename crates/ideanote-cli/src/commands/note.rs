//! Note command handlers

use anyhow::{Context, Result};
use uuid::Uuid;

use ideanote_core::{EntityStore, NoteColor, NoteForm, Notebook, Snapshot};

use super::folder::{resolve_folder, resolve_view};
use super::resolve_id;
use crate::editor::{confirm, edit_text, note_template, parse_template, text_to_html};
use crate::output::{short_id, Output};

/// Create a new note
///
/// Opens the editor when no body is given on the command line.
pub fn create<S: EntityStore>(
    notebook: &mut Notebook<S>,
    body: Option<String>,
    title: Option<String>,
    tags: Vec<String>,
    color: Option<String>,
    folder: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut form = match body {
        Some(body) => NoteForm::new().with_text(text_to_html(&body)),
        None => {
            let edited = edit_text(&note_template(None))?;
            parse_template(&edited)?
        }
    };

    if let Some(title) = title {
        form.title = title;
    }
    for tag in tags {
        if !form.selected_tags.contains(&tag) {
            form.toggle_tag(&tag);
        }
    }
    if let Some(color) = color {
        form.color = Some(color.parse::<NoteColor>()?);
    }

    if let Some(folder) = folder {
        form.folder_id = Some(resolve_folder(&*notebook.snapshot()?, &folder)?);
    }

    let payload = form.submit()?;
    let id = notebook
        .create_note(payload)
        .context("Failed to create note")?;

    output.success(&format!("Created note: {}", id));
    if output.is_quiet() {
        println!("{}", id);
    }
    Ok(())
}

/// List notes in a view, filtered by search text and tag
pub fn list<S: EntityStore>(
    notebook: &mut Notebook<S>,
    view: Option<String>,
    search: Option<String>,
    tag: Option<String>,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;

    if let Some(view) = view {
        notebook.set_view(resolve_view(&snapshot, &view)?);
    }
    notebook.set_search(search.unwrap_or_default());
    notebook.set_tag_filter(tag);

    let notes = notebook.visible_in(&snapshot);
    output.print_notes(&notes);
    Ok(())
}

/// Show a single note
pub fn show<S: EntityStore>(notebook: &Notebook<S>, id: String, output: &Output) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let uuid = parse_note_id(&id, &snapshot)?;

    let note = snapshot
        .note(uuid)
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    output.print_note(note, &snapshot);
    Ok(())
}

/// Edit a note in $EDITOR
pub fn edit<S: EntityStore>(notebook: &mut Notebook<S>, id: String, output: &Output) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let uuid = parse_note_id(&id, &snapshot)?;
    let note = snapshot
        .note(uuid)
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    let template = note_template(Some(note));
    let edited = edit_text(&template)?;
    if edited == template {
        output.message("No changes made.");
        return Ok(());
    }

    let payload = parse_template(&edited)?.submit()?;
    notebook
        .update_note(uuid, payload)
        .context("Failed to update note")?;

    output.success(&format!("Updated note: {}", uuid));
    Ok(())
}

/// Toggle the pinned flag
pub fn pin<S: EntityStore>(notebook: &mut Notebook<S>, id: String, output: &Output) -> Result<()> {
    let uuid = parse_note_id(&id, &*notebook.snapshot()?)?;
    let pinned = notebook.toggle_pin(uuid)?;
    output.success(&format!(
        "{} note {}",
        if pinned { "Pinned" } else { "Unpinned" },
        short_id(&uuid)
    ));
    Ok(())
}

/// Toggle the favorite flag
pub fn favorite<S: EntityStore>(
    notebook: &mut Notebook<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_note_id(&id, &*notebook.snapshot()?)?;
    let favorite = notebook.toggle_favorite(uuid)?;
    output.success(&format!(
        "{} note {}",
        if favorite { "Favorited" } else { "Unfavorited" },
        short_id(&uuid)
    ));
    Ok(())
}

/// Set a note's color, or advance to the next one
pub fn color<S: EntityStore>(
    notebook: &mut Notebook<S>,
    id: String,
    color: Option<String>,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let uuid = parse_note_id(&id, &snapshot)?;

    let color = match color {
        Some(color) => {
            let color: NoteColor = color.parse()?;
            let note = snapshot
                .note(uuid)
                .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;
            let mut form = NoteForm::editing(note);
            form.color = Some(color);
            notebook.update_note(uuid, form.submit()?)?;
            color
        }
        None => notebook.cycle_color(uuid)?,
    };

    output.success(&format!("Note {} is now {}", short_id(&uuid), color));
    Ok(())
}

/// Move a note into a folder, or out of every folder
pub fn move_to<S: EntityStore>(
    notebook: &mut Notebook<S>,
    id: String,
    folder: Option<String>,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let uuid = parse_note_id(&id, &snapshot)?;
    let folder_id = match folder {
        Some(folder) => Some(resolve_folder(&snapshot, &folder)?),
        None => None,
    };

    notebook
        .move_note(uuid, folder_id)
        .context("Failed to move note")?;

    let target = folder_id
        .and_then(|f| snapshot.folder(f))
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "uncategorized".to_string());
    output.success(&format!("Moved note {} to {}", short_id(&uuid), target));
    Ok(())
}

/// Delete a note
pub fn delete<S: EntityStore>(
    notebook: &mut Notebook<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let uuid = parse_note_id(&id, &snapshot)?;
    let note = snapshot
        .note(uuid)
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    if output.should_prompt() {
        let prompt = format!("Delete note '{}'?", note.display_title());
        if !confirm(&prompt)? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    notebook
        .delete_note(uuid)
        .context("Failed to delete note")?;

    output.success(&format!("Deleted note: {}", uuid));
    Ok(())
}

/// Parse a note ID (full UUID or unique prefix)
fn parse_note_id(id: &str, snapshot: &Snapshot) -> Result<Uuid> {
    resolve_id(id, "note", &snapshot.notes, |n| n.id, |n| n.display_title())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ideanote_core::{DocumentStore, FolderForm, ViewSelector};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn notebook_with_note(text: &str) -> (Notebook<DocumentStore>, Uuid) {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        create(
            &mut notebook,
            Some(text.to_string()),
            None,
            vec![],
            None,
            None,
            &quiet(),
        )
        .unwrap();
        let id = notebook.snapshot().unwrap().notes[0].id;
        (notebook, id)
    }

    #[test]
    fn test_create_with_flags() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        let folder = notebook
            .create_folder(FolderForm::new().with_name("Work").submit().unwrap())
            .unwrap();

        create(
            &mut notebook,
            Some("Buy <milk>".to_string()),
            Some("Groceries".to_string()),
            vec!["home".to_string(), "home".to_string()],
            Some("mint".to_string()),
            Some("work".to_string()),
            &quiet(),
        )
        .unwrap();

        let snapshot = notebook.snapshot().unwrap();
        let note = &snapshot.notes[0];
        assert_eq!(note.text, "<p>Buy &lt;milk&gt;</p>");
        assert_eq!(note.title.as_deref(), Some("Groceries"));
        assert_eq!(note.tags, vec!["home"]);
        assert_eq!(note.color, NoteColor::Mint);
        assert_eq!(note.folder_id, Some(folder));
        assert!(snapshot.tag_by_name("home").is_some());
    }

    #[test]
    fn test_create_rejects_blank_body() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        let result = create(
            &mut notebook,
            Some("   ".to_string()),
            None,
            vec![],
            None,
            None,
            &quiet(),
        );
        assert!(result.is_err());
        assert!(notebook.snapshot().unwrap().notes.is_empty());
    }

    #[test]
    fn test_create_unknown_folder_creates_nothing() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        let result = create(
            &mut notebook,
            Some("x".to_string()),
            None,
            vec![],
            None,
            Some("nowhere".to_string()),
            &quiet(),
        );
        assert!(result.is_err());
        assert!(notebook.snapshot().unwrap().notes.is_empty());
    }

    #[test]
    fn test_pin_and_favorite_toggle() {
        let (mut notebook, id) = notebook_with_note("hello");
        let prefix = id.to_string()[..8].to_string();

        pin(&mut notebook, prefix.clone(), &quiet()).unwrap();
        favorite(&mut notebook, prefix.clone(), &quiet()).unwrap();
        let note = notebook.snapshot().unwrap().note(id).cloned().unwrap();
        assert!(note.is_pinned);
        assert!(note.is_favorite);

        pin(&mut notebook, prefix, &quiet()).unwrap();
        assert!(!notebook.snapshot().unwrap().note(id).unwrap().is_pinned);
    }

    #[test]
    fn test_color_set_and_cycle() {
        let (mut notebook, id) = notebook_with_note("hello");

        color(&mut notebook, id.to_string(), Some("coral".to_string()), &quiet()).unwrap();
        assert_eq!(
            notebook.snapshot().unwrap().note(id).unwrap().color,
            NoteColor::Coral
        );

        color(&mut notebook, id.to_string(), None, &quiet()).unwrap();
        assert_eq!(
            notebook.snapshot().unwrap().note(id).unwrap().color,
            NoteColor::White
        );
    }

    #[test]
    fn test_move_and_list_by_view() {
        let (mut notebook, id) = notebook_with_note("hello");
        notebook
            .create_folder(FolderForm::new().with_name("Work").submit().unwrap())
            .unwrap();

        move_to(&mut notebook, id.to_string(), Some("Work".to_string()), &quiet()).unwrap();
        list(&mut notebook, Some("work".to_string()), None, None, &quiet()).unwrap();
        assert!(matches!(notebook.view(), ViewSelector::Folder(_)));
        assert_eq!(notebook.visible_notes().unwrap().len(), 1);

        move_to(&mut notebook, id.to_string(), None, &quiet()).unwrap();
        assert!(notebook.visible_notes().unwrap().is_empty());
    }

    #[test]
    fn test_list_search_and_tag() {
        let (mut notebook, _) = notebook_with_note("alpha");
        create(
            &mut notebook,
            Some("beta".to_string()),
            None,
            vec!["work".to_string()],
            None,
            None,
            &quiet(),
        )
        .unwrap();

        list(&mut notebook, None, Some("ALP".to_string()), None, &quiet()).unwrap();
        let visible = notebook.visible_notes().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text, "<p>alpha</p>");

        list(&mut notebook, None, None, Some("work".to_string()), &quiet()).unwrap();
        let visible = notebook.visible_notes().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text, "<p>beta</p>");
    }

    #[test]
    fn test_delete_quiet_skips_prompt() {
        let (mut notebook, id) = notebook_with_note("bye");
        delete(&mut notebook, id.to_string(), &quiet()).unwrap();
        assert!(notebook.snapshot().unwrap().notes.is_empty());
        assert!(show(&notebook, id.to_string(), &quiet()).is_err());
    }
}
