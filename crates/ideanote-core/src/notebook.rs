//! Mutation handlers and view state
//!
//! `Notebook` owns an entity store together with the single-threaded view
//! state (selector, search text, tag filter). Every mutation is turned into one
//! transaction, so cascades touching several records either commit together or
//! not at all.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::forms::{FolderPayload, NotePayload};
use crate::models::{Folder, Note, NoteColor, Tag};
use crate::store::{
    Collection, EntityStore, FolderPatch, LiveQuery, NotePatch, Op, Patch, Record, Snapshot,
    TagPatch, Transaction,
};
use crate::view::{self, NoteCounts, ViewSelector, ViewState};

/// Notes, tags and folders plus the current view
pub struct Notebook<S> {
    store: S,
    state: ViewState,
}

impl<S: EntityStore> Notebook<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: ViewState::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveQuery> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> StoreResult<Arc<Snapshot>> {
        self.store.snapshot()
    }

    // ==================== View state ====================

    pub fn view_state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> ViewSelector {
        self.state.view
    }

    pub fn set_view(&mut self, view: ViewSelector) {
        self.state.view = view;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.state.search = search.into();
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.state.tag_filter = tag;
    }

    /// Notes to display for the current view
    pub fn visible_notes(&self) -> StoreResult<Vec<Note>> {
        Ok(self.visible_in(&*self.store.snapshot()?))
    }

    /// Derive the current view over a given snapshot
    pub fn visible_in(&self, snapshot: &Snapshot) -> Vec<Note> {
        view::derive(&snapshot.notes, &self.state)
    }

    pub fn counts(&self) -> StoreResult<NoteCounts> {
        Ok(NoteCounts::from_notes(&self.store.snapshot()?.notes))
    }

    // ==================== Notes ====================

    /// Create a note, adding any tags not yet in the tag set
    pub fn create_note(&mut self, payload: NotePayload) -> StoreResult<Uuid> {
        let snapshot = self.store.snapshot()?;
        if let Some(folder_id) = payload.folder_id() {
            if snapshot.folder(folder_id).is_none() {
                return Err(StoreError::NotFound {
                    collection: Collection::Folders,
                    id: folder_id,
                });
            }
        }

        let mut note = Note::new(payload.text());
        note.title = payload.title().map(str::to_string);
        note.tags = payload.tags().to_vec();
        if let Some(color) = payload.color() {
            note.color = color;
        }
        note.folder_id = payload.folder_id();
        let id = note.id;

        let mut tx = Transaction::new().with_message("Create note");
        push_missing_tags(&mut tx, &snapshot, payload.tags());
        tx.push(Op::Create(Record::Note(note)));

        self.store.transact(tx)?;
        debug!("Created note {}", id);
        Ok(id)
    }

    /// Replace a note's text, title, tags and color
    ///
    /// The folder is left alone; filing goes through `move_note`.
    pub fn update_note(&mut self, id: Uuid, payload: NotePayload) -> StoreResult<()> {
        let snapshot = self.store.snapshot()?;
        let note = require_note(&snapshot, id)?;

        let mut tx = Transaction::new().with_message("Update note");
        push_missing_tags(&mut tx, &snapshot, payload.tags());
        tx.push(Op::Update {
            id,
            patch: Patch::Note(NotePatch {
                text: Some(payload.text().to_string()),
                title: Some(payload.title().map(str::to_string)),
                color: Some(payload.color().unwrap_or(note.color)),
                tags: Some(payload.tags().to_vec()),
                ..Default::default()
            }),
        });

        self.store.transact(tx)
    }

    /// Flip the pinned flag, returning the new value
    pub fn toggle_pin(&mut self, id: Uuid) -> StoreResult<bool> {
        let pinned = !require_note(&*self.store.snapshot()?, id)?.is_pinned;
        self.patch_note(
            id,
            NotePatch {
                is_pinned: Some(pinned),
                ..Default::default()
            },
            if pinned { "Pin note" } else { "Unpin note" },
        )?;
        Ok(pinned)
    }

    /// Flip the favorite flag, returning the new value
    pub fn toggle_favorite(&mut self, id: Uuid) -> StoreResult<bool> {
        let favorite = !require_note(&*self.store.snapshot()?, id)?.is_favorite;
        self.patch_note(
            id,
            NotePatch {
                is_favorite: Some(favorite),
                ..Default::default()
            },
            if favorite { "Favorite note" } else { "Unfavorite note" },
        )?;
        Ok(favorite)
    }

    /// Advance a note to the next color in the palette
    pub fn cycle_color(&mut self, id: Uuid) -> StoreResult<NoteColor> {
        let color = require_note(&*self.store.snapshot()?, id)?.color.next();
        self.patch_note(
            id,
            NotePatch {
                color: Some(color),
                ..Default::default()
            },
            "Change note color",
        )?;
        Ok(color)
    }

    /// File a note under a folder, or make it uncategorized with `None`
    pub fn move_note(&mut self, id: Uuid, folder_id: Option<Uuid>) -> StoreResult<()> {
        let snapshot = self.store.snapshot()?;
        require_note(&snapshot, id)?;
        if let Some(folder_id) = folder_id {
            if snapshot.folder(folder_id).is_none() {
                return Err(StoreError::NotFound {
                    collection: Collection::Folders,
                    id: folder_id,
                });
            }
        }

        self.patch_note(
            id,
            NotePatch {
                folder_id: Some(folder_id),
                ..Default::default()
            },
            "Move note",
        )
    }

    /// Delete a note (no undo)
    pub fn delete_note(&mut self, id: Uuid) -> StoreResult<()> {
        self.store.transact(
            Transaction::new()
                .with_message("Delete note")
                .delete(Collection::Notes, id),
        )
    }

    fn patch_note(&mut self, id: Uuid, patch: NotePatch, message: &str) -> StoreResult<()> {
        self.store.transact(
            Transaction::new()
                .with_message(message)
                .update(id, Patch::Note(patch)),
        )
    }

    // ==================== Tags ====================

    /// Add a tag to the tag set
    ///
    /// Blank or already-present names are ignored and return `None`.
    pub fn add_tag(&mut self, name: &str) -> StoreResult<Option<Uuid>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if self.store.snapshot()?.tag_by_name(name).is_some() {
            return Ok(None);
        }

        let tag = Tag::new(name);
        let id = tag.id;
        self.store.transact(
            Transaction::new()
                .with_message("Add tag")
                .create(Record::Tag(tag)),
        )?;
        Ok(Some(id))
    }

    /// Rename a tag, carrying the new name onto every note that has it
    pub fn rename_tag(&mut self, id: Uuid, new_name: &str) -> StoreResult<()> {
        let snapshot = self.store.snapshot()?;
        let tag = snapshot.tag(id).ok_or(StoreError::NotFound {
            collection: Collection::Tags,
            id,
        })?;
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == tag.name {
            return Ok(());
        }
        if snapshot.tag_by_name(new_name).is_some() {
            return Err(StoreError::AlreadyExists {
                collection: Collection::Tags,
                id,
            });
        }

        let mut tx = Transaction::new().with_message("Rename tag").update(
            id,
            Patch::Tag(TagPatch {
                name: Some(new_name.to_string()),
            }),
        );
        for note in snapshot.notes.iter().filter(|n| n.has_tag(&tag.name)) {
            let tags = note
                .tags
                .iter()
                .map(|t| {
                    if *t == tag.name {
                        new_name.to_string()
                    } else {
                        t.clone()
                    }
                })
                .collect();
            tx.push(tag_update(note.id, tags));
        }
        self.store.transact(tx)?;

        if self.state.tag_filter.as_deref() == Some(tag.name.as_str()) {
            self.state.tag_filter = Some(new_name.to_string());
        }
        Ok(())
    }

    /// Delete a tag and strip it from every note, in one batch
    pub fn delete_tag(&mut self, id: Uuid) -> StoreResult<()> {
        let snapshot = self.store.snapshot()?;
        let tag = snapshot.tag(id).ok_or(StoreError::NotFound {
            collection: Collection::Tags,
            id,
        })?;

        let mut tx = Transaction::new()
            .with_message("Delete tag")
            .delete(Collection::Tags, id);
        for note in snapshot.notes.iter().filter(|n| n.has_tag(&tag.name)) {
            let mut tags = note.tags.clone();
            tags.retain(|t| *t != tag.name);
            tx.push(tag_update(note.id, tags));
        }
        debug!("Deleting tag {} ({} notes affected)", tag.name, tx.len() - 1);
        self.store.transact(tx)?;

        if self.state.tag_filter.as_deref() == Some(tag.name.as_str()) {
            self.state.tag_filter = None;
        }
        Ok(())
    }

    // ==================== Folders ====================

    pub fn create_folder(&mut self, payload: FolderPayload) -> StoreResult<Uuid> {
        let mut folder = Folder::new(payload.name());
        folder.color = Some(payload.color());
        let id = folder.id;

        self.store.transact(
            Transaction::new()
                .with_message("Create folder")
                .create(Record::Folder(folder)),
        )?;
        Ok(id)
    }

    pub fn update_folder(&mut self, id: Uuid, payload: FolderPayload) -> StoreResult<()> {
        self.store.transact(
            Transaction::new().with_message("Update folder").update(
                id,
                Patch::Folder(FolderPatch {
                    name: Some(payload.name().to_string()),
                    color: Some(Some(payload.color())),
                }),
            ),
        )
    }

    /// Delete a folder and unfile its notes, in one batch
    ///
    /// If the folder was the active view, the view falls back to all notes.
    pub fn delete_folder(&mut self, id: Uuid) -> StoreResult<()> {
        let snapshot = self.store.snapshot()?;

        let mut tx = Transaction::new()
            .with_message("Delete folder")
            .delete(Collection::Folders, id);
        for note in snapshot.notes.iter().filter(|n| n.folder_id == Some(id)) {
            tx.push(Op::Update {
                id: note.id,
                patch: Patch::Note(NotePatch {
                    folder_id: Some(None),
                    ..Default::default()
                }),
            });
        }
        debug!("Deleting folder {} ({} notes unfiled)", id, tx.len() - 1);
        self.store.transact(tx)?;

        if self.state.view == ViewSelector::Folder(id) {
            self.state.view = ViewSelector::All;
        }
        Ok(())
    }
}

fn require_note(snapshot: &Snapshot, id: Uuid) -> StoreResult<&Note> {
    snapshot.note(id).ok_or(StoreError::NotFound {
        collection: Collection::Notes,
        id,
    })
}

fn push_missing_tags(tx: &mut Transaction, snapshot: &Snapshot, names: &[String]) {
    for name in names {
        if snapshot.tag_by_name(name).is_none() {
            tx.push(Op::Create(Record::Tag(Tag::new(name.as_str()))));
        }
    }
}

fn tag_update(note_id: Uuid, tags: Vec<String>) -> Op {
    Op::Update {
        id: note_id,
        patch: Patch::Note(NotePatch {
            tags: Some(tags),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{FolderForm, NoteForm};
    use crate::models::FolderColor;
    use crate::store::DocumentStore;

    fn notebook() -> Notebook<DocumentStore> {
        Notebook::new(DocumentStore::in_memory())
    }

    fn payload(text: &str) -> NotePayload {
        NoteForm::new().with_text(text).submit().unwrap()
    }

    fn tagged_payload(text: &str, tags: &[&str]) -> NotePayload {
        let mut form = NoteForm::new().with_text(text);
        form.selected_tags = tags.iter().map(|t| t.to_string()).collect();
        form.submit().unwrap()
    }

    fn folder(book: &mut Notebook<DocumentStore>, name: &str) -> Uuid {
        book.create_folder(FolderForm::new().with_name(name).submit().unwrap())
            .unwrap()
    }

    #[test]
    fn test_create_note_adds_new_tags() {
        let mut book = notebook();
        book.add_tag("work").unwrap();

        let id = book
            .create_note(tagged_payload("<p>plan</p>", &["work", "q3"]))
            .unwrap();

        let snapshot = book.snapshot().unwrap();
        let note = snapshot.note(id).unwrap();
        assert_eq!(note.tags, vec!["work", "q3"]);
        assert_eq!(snapshot.tag_names(), vec!["q3", "work"]);
    }

    #[test]
    fn test_create_note_explicit_color() {
        let mut book = notebook();
        let mut form = NoteForm::new().with_text("x");
        form.color = Some(NoteColor::Mint);
        let id = book.create_note(form.submit().unwrap()).unwrap();
        assert_eq!(book.snapshot().unwrap().note(id).unwrap().color, NoteColor::Mint);
    }

    #[test]
    fn test_create_note_in_folder() {
        let mut book = notebook();
        let work = folder(&mut book, "Work");

        let filed = NoteForm::new().with_text("agenda").with_folder(Some(work));
        let id = book.create_note(filed.submit().unwrap()).unwrap();
        assert_eq!(book.snapshot().unwrap().note(id).unwrap().folder_id, Some(work));

        // Editing the text keeps the note filed
        book.update_note(id, payload("agenda v2")).unwrap();
        assert_eq!(book.snapshot().unwrap().note(id).unwrap().folder_id, Some(work));

        let stray = NoteForm::new().with_text("lost").with_folder(Some(Uuid::new_v4()));
        let err = book.create_note(stray.submit().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                collection: Collection::Folders,
                ..
            }
        ));
        assert_eq!(book.snapshot().unwrap().notes.len(), 1);
    }

    #[test]
    fn test_update_note() {
        let mut book = notebook();
        let id = book.create_note(payload("old")).unwrap();
        let color = book.snapshot().unwrap().note(id).unwrap().color;

        let mut form = NoteForm::new().with_text("new").with_title("Title");
        form.selected_tags = vec!["fresh".into()];
        book.update_note(id, form.submit().unwrap()).unwrap();

        let snapshot = book.snapshot().unwrap();
        let note = snapshot.note(id).unwrap();
        assert_eq!(note.text, "new");
        assert_eq!(note.title.as_deref(), Some("Title"));
        assert_eq!(note.tags, vec!["fresh"]);
        assert_eq!(note.color, color);
        assert!(snapshot.tag_by_name("fresh").is_some());
    }

    #[test]
    fn test_toggles_flip() {
        let mut book = notebook();
        let id = book.create_note(payload("x")).unwrap();

        assert!(book.toggle_pin(id).unwrap());
        assert!(book.snapshot().unwrap().note(id).unwrap().is_pinned);
        assert!(!book.toggle_pin(id).unwrap());
        assert!(!book.snapshot().unwrap().note(id).unwrap().is_pinned);

        assert!(book.toggle_favorite(id).unwrap());
        assert!(book.snapshot().unwrap().note(id).unwrap().is_favorite);
    }

    #[test]
    fn test_cycle_color() {
        let mut book = notebook();
        let id = book.create_note(payload("x")).unwrap();
        let before = book.snapshot().unwrap().note(id).unwrap().color;

        let after = book.cycle_color(id).unwrap();
        assert_eq!(after, before.next());
        assert_eq!(book.snapshot().unwrap().note(id).unwrap().color, after);
    }

    #[test]
    fn test_toggle_missing_note() {
        let mut book = notebook();
        let err = book.toggle_pin(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_move_note() {
        let mut book = notebook();
        let id = book.create_note(payload("x")).unwrap();
        let work = folder(&mut book, "Work");

        book.move_note(id, Some(work)).unwrap();
        assert_eq!(book.snapshot().unwrap().note(id).unwrap().folder_id, Some(work));

        let err = book.move_note(id, Some(Uuid::new_v4())).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                collection: Collection::Folders,
                ..
            }
        ));

        book.move_note(id, None).unwrap();
        assert!(book.snapshot().unwrap().note(id).unwrap().folder_id.is_none());
    }

    #[test]
    fn test_delete_note() {
        let mut book = notebook();
        let id = book.create_note(payload("x")).unwrap();
        book.delete_note(id).unwrap();
        assert!(book.snapshot().unwrap().notes.is_empty());
        assert!(book.delete_note(id).is_err());
    }

    #[test]
    fn test_add_tag_ignores_blank_and_duplicates() {
        let mut book = notebook();
        assert!(book.add_tag("  ").unwrap().is_none());
        assert!(book.add_tag(" idea ").unwrap().is_some());
        assert!(book.add_tag("idea").unwrap().is_none());
        assert_eq!(book.snapshot().unwrap().tag_names(), vec!["idea"]);
    }

    #[test]
    fn test_delete_tag_strips_from_all_notes() {
        let mut book = notebook();
        let a = book.create_note(tagged_payload("a", &["work", "home"])).unwrap();
        let b = book.create_note(tagged_payload("b", &["work"])).unwrap();
        let c = book.create_note(tagged_payload("c", &["home"])).unwrap();
        book.set_tag_filter(Some("work".into()));

        let work = book.snapshot().unwrap().tag_by_name("work").unwrap().id;
        book.delete_tag(work).unwrap();

        let snapshot = book.snapshot().unwrap();
        assert!(snapshot.tag_by_name("work").is_none());
        assert!(snapshot.notes.iter().all(|n| !n.has_tag("work")));
        assert_eq!(snapshot.note(a).unwrap().tags, vec!["home"]);
        assert!(snapshot.note(b).unwrap().tags.is_empty());
        assert_eq!(snapshot.note(c).unwrap().tags, vec!["home"]);
        assert!(book.view_state().tag_filter.is_none());
    }

    #[test]
    fn test_rename_tag() {
        let mut book = notebook();
        let id = book.create_note(tagged_payload("a", &["wrk", "home"])).unwrap();
        let tag = book.snapshot().unwrap().tag_by_name("wrk").unwrap().id;

        book.rename_tag(tag, "work").unwrap();
        let snapshot = book.snapshot().unwrap();
        assert_eq!(snapshot.note(id).unwrap().tags, vec!["work", "home"]);
        assert!(snapshot.tag_by_name("wrk").is_none());

        let err = book.rename_tag(tag, "home").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn test_delete_folder_unfiles_notes_and_resets_view() {
        let mut book = notebook();
        let f = folder(&mut book, "F");
        let a = book.create_note(payload("a")).unwrap();
        let b = book.create_note(payload("b")).unwrap();
        book.move_note(a, Some(f)).unwrap();
        book.move_note(b, Some(f)).unwrap();

        book.set_view(ViewSelector::Folder(f));
        assert_eq!(book.visible_notes().unwrap().len(), 2);

        book.delete_folder(f).unwrap();

        let snapshot = book.snapshot().unwrap();
        assert!(snapshot.folder(f).is_none());
        assert!(snapshot.note(a).unwrap().folder_id.is_none());
        assert!(snapshot.note(b).unwrap().folder_id.is_none());
        assert_eq!(book.view(), ViewSelector::All);
    }

    #[test]
    fn test_delete_other_folder_keeps_view() {
        let mut book = notebook();
        let keep = folder(&mut book, "Keep");
        let gone = folder(&mut book, "Gone");
        book.set_view(ViewSelector::Folder(keep));

        book.delete_folder(gone).unwrap();
        assert_eq!(book.view(), ViewSelector::Folder(keep));
    }

    #[test]
    fn test_delete_missing_folder_changes_nothing() {
        let mut book = notebook();
        let f = folder(&mut book, "F");
        let a = book.create_note(payload("a")).unwrap();
        book.move_note(a, Some(f)).unwrap();
        book.delete_folder(f).unwrap();

        // Deleting again fails as a whole
        assert!(book.delete_folder(f).is_err());
    }

    #[test]
    fn test_update_folder() {
        let mut book = notebook();
        let f = folder(&mut book, "Old");
        let mut form = FolderForm::new().with_name("New");
        form.color = FolderColor::Green;
        book.update_folder(f, form.submit().unwrap()).unwrap();

        let snapshot = book.snapshot().unwrap();
        let folder = snapshot.folder(f).unwrap();
        assert_eq!(folder.name, "New");
        assert_eq!(folder.color, Some(FolderColor::Green));
    }

    #[test]
    fn test_visible_notes_and_counts() {
        let mut book = notebook();
        let a = book.create_note(payload("buy milk")).unwrap();
        let b = book.create_note(payload("call mom")).unwrap();
        book.toggle_pin(b).unwrap();
        book.toggle_favorite(b).unwrap();

        let visible: Vec<Uuid> = book.visible_notes().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(visible, vec![b, a]);

        book.set_search("milk");
        let visible: Vec<Uuid> = book.visible_notes().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(visible, vec![a]);

        book.set_search("");
        book.set_view(ViewSelector::Favorites);
        let visible: Vec<Uuid> = book.visible_notes().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(visible, vec![b]);

        let counts = book.counts().unwrap();
        assert_eq!(counts.all, 2);
        assert_eq!(counts.favorites, 1);
        assert_eq!(counts.uncategorized, 2);
    }

    #[test]
    fn test_subscription_sees_mutations() {
        let mut book = notebook();
        let mut rx = book.subscribe();
        rx.borrow_and_update();

        let id = book.create_note(payload("x")).unwrap();
        assert!(rx.has_changed().unwrap());
        let query = rx.borrow_and_update().clone();
        assert!(query.snapshot().unwrap().note(id).is_some());
    }
}
