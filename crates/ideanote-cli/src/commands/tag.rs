//! Tag command handlers

use anyhow::{Context, Result};
use uuid::Uuid;

use ideanote_core::{EntityStore, Notebook, Snapshot};

use super::resolve_id;
use crate::editor::confirm;
use crate::output::Output;

/// List all tags with usage counts
pub fn list<S: EntityStore>(notebook: &Notebook<S>, output: &Output) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    output.print_tags(&snapshot.tags, &snapshot.notes);
    Ok(())
}

/// Add a tag to the tag set
pub fn add<S: EntityStore>(notebook: &mut Notebook<S>, name: String, output: &Output) -> Result<()> {
    match notebook.add_tag(&name).context("Failed to add tag")? {
        Some(id) => output.success(&format!("Added tag: {} ({})", name.trim(), id)),
        None => output.message(&format!("Tag already exists: {}", name.trim())),
    }
    Ok(())
}

/// Rename a tag everywhere it is used
pub fn rename<S: EntityStore>(
    notebook: &mut Notebook<S>,
    tag: String,
    new_name: String,
    output: &Output,
) -> Result<()> {
    let id = resolve_tag(&*notebook.snapshot()?, &tag)?;
    notebook
        .rename_tag(id, &new_name)
        .with_context(|| format!("Failed to rename tag '{}'", tag))?;

    output.success(&format!("Renamed tag {} -> {}", tag, new_name.trim()));
    Ok(())
}

/// Delete a tag and remove it from every note
pub fn delete<S: EntityStore>(
    notebook: &mut Notebook<S>,
    tag: String,
    output: &Output,
) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let id = resolve_tag(&snapshot, &tag)?;

    if output.should_prompt() {
        let name = snapshot.tag(id).map(|t| t.name.as_str()).unwrap_or("?");
        let used = snapshot.notes.iter().filter(|n| n.has_tag(name)).count();
        let prompt = format!("Delete tag '{}' (used by {} note(s))?", name, used);
        if !confirm(&prompt)? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    notebook.delete_tag(id).context("Failed to delete tag")?;

    output.success(&format!("Deleted tag: {}", tag));
    Ok(())
}

/// Find a tag by exact name or by id prefix
fn resolve_tag(snapshot: &Snapshot, input: &str) -> Result<Uuid> {
    if let Some(tag) = snapshot.tag_by_name(input.trim()) {
        return Ok(tag.id);
    }
    resolve_id(input, "tag", &snapshot.tags, |t| t.id, |t| t.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ideanote_core::{DocumentStore, NoteForm};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn tagged_notebook() -> (Notebook<DocumentStore>, Uuid) {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        let mut form = NoteForm::new().with_text("x");
        form.toggle_tag("work");
        form.toggle_tag("urgent");
        let id = notebook.create_note(form.submit().unwrap()).unwrap();
        (notebook, id)
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut notebook = Notebook::new(DocumentStore::in_memory());
        add(&mut notebook, "ideas".to_string(), &quiet()).unwrap();
        add(&mut notebook, " ideas ".to_string(), &quiet()).unwrap();
        assert_eq!(notebook.snapshot().unwrap().tag_names(), vec!["ideas"]);
    }

    #[test]
    fn test_rename_by_name() {
        let (mut notebook, note_id) = tagged_notebook();
        rename(&mut notebook, "work".to_string(), "office".to_string(), &quiet()).unwrap();

        let snapshot = notebook.snapshot().unwrap();
        assert!(snapshot.tag_by_name("work").is_none());
        assert!(snapshot.note(note_id).unwrap().has_tag("office"));
    }

    #[test]
    fn test_rename_onto_existing_fails() {
        let (mut notebook, _) = tagged_notebook();
        assert!(rename(&mut notebook, "work".to_string(), "urgent".to_string(), &quiet()).is_err());
    }

    #[test]
    fn test_delete_strips_notes() {
        let (mut notebook, note_id) = tagged_notebook();
        delete(&mut notebook, "urgent".to_string(), &quiet()).unwrap();

        let snapshot = notebook.snapshot().unwrap();
        assert_eq!(snapshot.tag_names(), vec!["work"]);
        assert_eq!(snapshot.note(note_id).unwrap().tags, vec!["work"]);
        assert!(delete(&mut notebook, "urgent".to_string(), &quiet()).is_err());
    }
}
