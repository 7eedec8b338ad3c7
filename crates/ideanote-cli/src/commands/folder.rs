//! Folder command handlers

use anyhow::{Context, Result};
use uuid::Uuid;

use ideanote_core::{EntityStore, FolderColor, FolderForm, Notebook, Snapshot, ViewSelector};

use super::resolve_id;
use crate::editor::confirm;
use crate::output::Output;

/// List folders with note counts
pub fn list<S: EntityStore>(notebook: &Notebook<S>, output: &Output) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let counts = notebook.counts()?;
    output.print_folders(&snapshot.folders, &counts);
    Ok(())
}

/// Create a folder
pub fn add<S: EntityStore>(
    notebook: &mut Notebook<S>,
    name: String,
    color: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut form = FolderForm::new().with_name(name);
    if let Some(color) = color {
        form.color = color.parse::<FolderColor>()?;
    }
    let payload = form.submit()?;

    let id = notebook
        .create_folder(payload)
        .context("Failed to create folder")?;

    output.success(&format!("Created folder: {}", id));
    Ok(())
}

/// Rename a folder and optionally recolor it
pub fn rename<S: EntityStore>(
    notebook: &mut Notebook<S>,
    folder: String,
    name: String,
    color: Option<String>,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let id = resolve_folder(&snapshot, &folder)?;
    let existing = snapshot
        .folder(id)
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", folder))?;

    let mut form = FolderForm::editing(existing).with_name(name);
    if let Some(color) = color {
        form.color = color.parse::<FolderColor>()?;
    }

    notebook
        .update_folder(id, form.submit()?)
        .context("Failed to update folder")?;

    output.success(&format!("Updated folder: {}", id));
    Ok(())
}

/// Delete a folder; its notes become uncategorized
pub fn delete<S: EntityStore>(
    notebook: &mut Notebook<S>,
    folder: String,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let id = resolve_folder(&snapshot, &folder)?;
    let counts = notebook.counts()?;
    let filed = counts.by_folder.get(&id).copied().unwrap_or(0);

    if output.should_prompt() {
        let name = snapshot.folder(id).map(|f| f.name.as_str()).unwrap_or("?");
        let prompt = if filed > 0 {
            format!(
                "Delete folder '{}'? Its {} note(s) will become uncategorized.",
                name, filed
            )
        } else {
            format!("Delete folder '{}'?", name)
        };
        if !confirm(&prompt)? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    notebook
        .delete_folder(id)
        .context("Failed to delete folder")?;

    output.success(&format!("Deleted folder: {}", id));
    Ok(())
}

/// Find a folder by exact name (case-insensitive) or by id prefix
pub(crate) fn resolve_folder(snapshot: &Snapshot, input: &str) -> Result<Uuid> {
    let wanted = input.trim();
    let by_name: Vec<_> = snapshot
        .folders
        .iter()
        .filter(|f| f.name.eq_ignore_ascii_case(wanted))
        .collect();
    if by_name.len() == 1 {
        return Ok(by_name[0].id);
    }

    resolve_id(
        wanted,
        "folder",
        &snapshot.folders,
        |f| f.id,
        |f| f.name.clone(),
    )
}

/// Parse a view name (`all`, `favorites`, `uncategorized`) or a folder
pub(crate) fn resolve_view(snapshot: &Snapshot, input: &str) -> Result<ViewSelector> {
    match input.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(ViewSelector::All),
        "favorites" | "fav" => Ok(ViewSelector::Favorites),
        "uncategorized" | "none" => Ok(ViewSelector::Uncategorized),
        _ => resolve_folder(snapshot, input).map(ViewSelector::Folder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ideanote_core::{DocumentStore, NoteForm};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_add_and_resolve() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        add(&mut notebook, "Work".to_string(), Some("green".to_string()), &quiet()).unwrap();

        let snapshot = notebook.snapshot().unwrap();
        let folder = &snapshot.folders[0];
        assert_eq!(folder.color, Some(FolderColor::Green));

        assert_eq!(resolve_folder(&snapshot, "work").unwrap(), folder.id);
        assert_eq!(
            resolve_folder(&snapshot, &folder.id.to_string()[..6]).unwrap(),
            folder.id
        );
        assert_eq!(
            resolve_view(&snapshot, "Work").unwrap(),
            ViewSelector::Folder(folder.id)
        );
        assert_eq!(resolve_view(&snapshot, "all").unwrap(), ViewSelector::All);
        assert!(resolve_view(&snapshot, "Personal").is_err());
    }

    #[test]
    fn test_add_blank_name_fails() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        assert!(add(&mut notebook, "  ".to_string(), None, &quiet()).is_err());
        assert!(add(&mut notebook, "Work".to_string(), Some("plaid".to_string()), &quiet()).is_err());
        assert!(notebook.snapshot().unwrap().folders.is_empty());
    }

    #[test]
    fn test_rename_keeps_color() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        add(&mut notebook, "Work".to_string(), Some("orange".to_string()), &quiet()).unwrap();

        rename(&mut notebook, "work".to_string(), "Office".to_string(), None, &quiet()).unwrap();

        let snapshot = notebook.snapshot().unwrap();
        assert_eq!(snapshot.folders[0].name, "Office");
        assert_eq!(snapshot.folders[0].color, Some(FolderColor::Orange));
    }

    #[test]
    fn test_delete_unfiles_notes() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        add(&mut notebook, "Work".to_string(), None, &quiet()).unwrap();
        let folder_id = notebook.snapshot().unwrap().folders[0].id;
        let note_id = notebook
            .create_note(NoteForm::new().with_text("x").submit().unwrap())
            .unwrap();
        notebook.move_note(note_id, Some(folder_id)).unwrap();

        delete(&mut notebook, "Work".to_string(), &quiet()).unwrap();

        let snapshot = notebook.snapshot().unwrap();
        assert!(snapshot.folders.is_empty());
        assert_eq!(snapshot.note(note_id).unwrap().folder_id, None);
    }
}
