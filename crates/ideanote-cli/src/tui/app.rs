//! TUI application state

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use ideanote_core::{
    Action, AppContext, EntityStore, FolderForm, Key, KeyPress, LiveQuery, Note, NoteCounts,
    Overlay, Snapshot, ViewSelector,
};

/// Current input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys go through the shortcut map
    Normal,
    /// Typing into the search box
    Search,
    /// Typing a new folder's name
    NewFolder,
    /// Choosing a tag to filter by
    TagFilter,
    /// Choosing a folder for the selected note
    MoveNote,
    /// Waiting for y/n
    Confirm(ConfirmAction),
}

impl InputMode {
    /// Whether keys are text for an input box
    pub fn is_text_input(self) -> bool {
        matches!(self, InputMode::Search | InputMode::NewFolder)
    }
}

/// A destructive action waiting for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteNote(Uuid),
    DeleteFolder(Uuid),
}

/// Work that needs the terminal handed to $EDITOR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTask {
    NewNote,
    EditNote(Uuid),
}

/// Application state
pub struct App {
    /// Last value seen on the live query
    pub query: LiveQuery,
    /// Sidebar entries: the fixed views, then one per folder
    pub views: Vec<ViewSelector>,
    pub counts: NoteCounts,
    /// Derived note list for the active view
    pub notes: Vec<Note>,
    pub note_index: usize,
    selected_id: Option<Uuid>,
    pub input_mode: InputMode,
    /// Text of the active input box
    pub input: String,
    /// Highlighted row in the tag or folder picker
    pub picker_index: usize,
    pub show_help: bool,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            query: LiveQuery::Loading,
            views: base_views(),
            counts: NoteCounts::default(),
            notes: Vec::new(),
            note_index: 0,
            selected_id: None,
            input_mode: InputMode::Normal,
            input: String::new(),
            picker_index: 0,
            show_help: false,
            should_quit: false,
        }
    }

    /// Take a new live-query value and re-derive everything shown
    pub fn refresh<S: EntityStore>(&mut self, ctx: &mut AppContext<S>, query: LiveQuery) {
        self.query = query;

        let Some(snapshot) = self.snapshot().cloned() else {
            return;
        };

        self.views = base_views();
        self.views
            .extend(snapshot.folders.iter().map(|f| ViewSelector::Folder(f.id)));
        self.counts = NoteCounts::from_notes(&snapshot.notes);

        // A folder deleted elsewhere falls back to all notes
        if let ViewSelector::Folder(id) = ctx.notebook.view() {
            if snapshot.folder(id).is_none() {
                ctx.notebook.set_view(ViewSelector::All);
            }
        }

        self.rederive(ctx);
    }

    /// Recompute the note list after a view, search or tag change
    pub fn rederive<S: EntityStore>(&mut self, ctx: &AppContext<S>) {
        let Some(snapshot) = self.snapshot().cloned() else {
            return;
        };
        self.notes = ctx.notebook.visible_in(&snapshot);

        self.note_index = self
            .selected_id
            .and_then(|id| self.notes.iter().position(|n| n.id == id))
            .unwrap_or_else(|| self.note_index.min(self.notes.len().saturating_sub(1)));
        self.selected_id = self.notes.get(self.note_index).map(|n| n.id);
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.query.snapshot()
    }

    /// Error to show full-screen, if the live query failed
    pub fn load_error(&self) -> Option<&str> {
        match &self.query {
            LiveQuery::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.notes.get(self.note_index)
    }

    /// Index of the active view in the sidebar
    pub fn view_index(&self, view: ViewSelector) -> usize {
        self.views.iter().position(|v| *v == view).unwrap_or(0)
    }

    /// Sidebar label for a view
    pub fn view_label(&self, view: &ViewSelector) -> String {
        match view {
            ViewSelector::All => "All Notes".to_string(),
            ViewSelector::Favorites => "★ Favorites".to_string(),
            ViewSelector::Uncategorized => "Uncategorized".to_string(),
            ViewSelector::Folder(id) => self
                .snapshot()
                .and_then(|s| s.folder(*id))
                .map(|f| format!("▸ {}", f.name))
                .unwrap_or_else(|| "▸ ?".to_string()),
        }
    }

    /// Rows of the open picker: tag names or folder names, after a "none" row
    pub fn picker_items(&self) -> Vec<String> {
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };
        match self.input_mode {
            InputMode::TagFilter => std::iter::once("(all tags)".to_string())
                .chain(snapshot.tags.iter().map(|t| format!("#{}", t.name)))
                .collect(),
            InputMode::MoveNote => std::iter::once("(uncategorized)".to_string())
                .chain(snapshot.folders.iter().map(|f| f.name.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    // ==================== Navigation ====================

    pub fn select_next(&mut self) {
        if !self.notes.is_empty() {
            self.note_index = (self.note_index + 1) % self.notes.len();
            self.selected_id = self.notes.get(self.note_index).map(|n| n.id);
        }
    }

    pub fn select_prev(&mut self) {
        if !self.notes.is_empty() {
            self.note_index = self
                .note_index
                .checked_sub(1)
                .unwrap_or(self.notes.len() - 1);
            self.selected_id = self.notes.get(self.note_index).map(|n| n.id);
        }
    }

    fn cycle_view<S: EntityStore>(&mut self, ctx: &mut AppContext<S>, forward: bool) {
        let len = self.views.len();
        let current = self.view_index(ctx.notebook.view());
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        ctx.notebook.set_view(self.views[next]);
        self.note_index = 0;
        self.selected_id = None;
        self.rederive(ctx);
    }

    // ==================== Actions ====================

    /// Run a shortcut action
    ///
    /// Returns an editor task when the action needs $EDITOR.
    pub fn perform<S: EntityStore>(
        &mut self,
        action: Action,
        ctx: &mut AppContext<S>,
    ) -> Option<EditorTask> {
        debug!("Action: {:?}", action);
        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = true,
            Action::Cancel => self.cancel(ctx),
            Action::SelectNext => self.select_next(),
            Action::SelectPrev => self.select_prev(),
            Action::NextView => self.cycle_view(ctx, true),
            Action::PrevView => self.cycle_view(ctx, false),
            Action::NewNote => return Some(EditorTask::NewNote),
            Action::EditNote => return self.current_note().map(|n| EditorTask::EditNote(n.id)),
            Action::FocusSearch => {
                ctx.overlays.search = true;
                self.input = ctx.notebook.view_state().search.clone();
                self.input_mode = InputMode::Search;
            }
            Action::TagFilter => {
                ctx.overlays.tag_filter = true;
                self.input_mode = InputMode::TagFilter;
                let current = ctx.notebook.view_state().tag_filter.clone();
                self.picker_index = current
                    .and_then(|tag| {
                        self.snapshot()
                            .and_then(|s| s.tags.iter().position(|t| t.name == tag))
                    })
                    .map(|i| i + 1)
                    .unwrap_or(0);
            }
            Action::NewFolder => {
                ctx.overlays.form = true;
                self.input.clear();
                self.input_mode = InputMode::NewFolder;
            }
            Action::DeleteNote => {
                if let Some(id) = self.current_note().map(|n| n.id) {
                    self.input_mode = InputMode::Confirm(ConfirmAction::DeleteNote(id));
                }
            }
            Action::DeleteFolder => match ctx.notebook.view() {
                ViewSelector::Folder(id) => {
                    self.input_mode = InputMode::Confirm(ConfirmAction::DeleteFolder(id));
                }
                _ => ctx.banner.show("Open a folder to delete it"),
            },
            Action::MoveNote => {
                let Some(current_folder) = self.current_note().map(|n| n.folder_id) else {
                    return None;
                };
                let folders = self.snapshot().map(|s| s.folders.clone()).unwrap_or_default();
                if folders.is_empty() {
                    ctx.banner.show("No folders yet (f to create one)");
                } else {
                    self.picker_index = current_folder
                        .and_then(|id| folders.iter().position(|f| f.id == id))
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    self.input_mode = InputMode::MoveNote;
                }
            }
            Action::TogglePin => {
                if let Some(id) = self.current_note().map(|n| n.id) {
                    match ctx.notebook.toggle_pin(id) {
                        Ok(true) => ctx.banner.show("Note pinned"),
                        Ok(false) => ctx.banner.show("Note unpinned"),
                        Err(e) => warn!("Failed to toggle pin on {}: {}", id, e),
                    }
                }
            }
            Action::ToggleFavorite => {
                if let Some(id) = self.current_note().map(|n| n.id) {
                    match ctx.notebook.toggle_favorite(id) {
                        Ok(true) => ctx.banner.show("Added to favorites"),
                        Ok(false) => ctx.banner.show("Removed from favorites"),
                        Err(e) => warn!("Failed to toggle favorite on {}: {}", id, e),
                    }
                }
            }
            Action::CycleColor => {
                if let Some(id) = self.current_note().map(|n| n.id) {
                    if let Err(e) = ctx.notebook.cycle_color(id) {
                        warn!("Failed to change color of {}: {}", id, e);
                    }
                }
            }
            Action::ToggleTheme => match ctx.theme.toggle() {
                Ok(theme) => ctx.banner.show(format!("Theme: {}", theme)),
                Err(e) => warn!("Failed to save theme: {:#}", e),
            },
        }
        None
    }

    /// Escape: close whatever is on top
    pub fn cancel<S: EntityStore>(&mut self, ctx: &mut AppContext<S>) {
        if matches!(self.input_mode, InputMode::Confirm(_) | InputMode::MoveNote) {
            self.input_mode = InputMode::Normal;
            return;
        }

        match ctx.overlays.close_topmost() {
            Some(Overlay::Form) => self.input.clear(),
            Some(Overlay::Search) => {
                self.input.clear();
                ctx.notebook.set_search("");
                self.rederive(ctx);
            }
            Some(Overlay::TagFilter) => {}
            None => {
                if ctx.notebook.view_state().tag_filter.is_some() {
                    ctx.notebook.set_tag_filter(None);
                    self.rederive(ctx);
                }
            }
        }
        self.input_mode = mode_for(ctx);
    }

    /// Keys not claimed by a shortcut while an input box has focus
    pub fn handle_text_key<S: EntityStore>(&mut self, press: KeyPress, ctx: &mut AppContext<S>) {
        match press.key {
            Key::Enter => {
                match self.input_mode {
                    InputMode::Search => ctx.overlays.search = false,
                    InputMode::NewFolder => {
                        self.create_folder(ctx);
                        ctx.overlays.form = false;
                    }
                    _ => {}
                }
                self.input.clear();
                self.input_mode = mode_for(ctx);
                return;
            }
            Key::Backspace => {
                self.input.pop();
            }
            Key::Char(c) if !press.ctrl && !press.meta => self.input.push(c),
            _ => return,
        }

        if self.input_mode == InputMode::Search {
            ctx.notebook.set_search(self.input.clone());
            self.note_index = 0;
            self.selected_id = None;
            self.rederive(ctx);
        }
    }

    /// Keys for the tag and folder pickers
    pub fn handle_picker_key<S: EntityStore>(&mut self, press: KeyPress, ctx: &mut AppContext<S>) {
        let len = self.picker_items().len().max(1);
        match press.key {
            Key::Char('j') | Key::Down => self.picker_index = (self.picker_index + 1) % len,
            Key::Char('k') | Key::Up => self.picker_index = (self.picker_index + len - 1) % len,
            Key::Escape => self.cancel(ctx),
            Key::Enter => {
                let choice = self.picker_index.checked_sub(1);
                match self.input_mode {
                    InputMode::TagFilter => {
                        let tag = choice.and_then(|i| {
                            self.snapshot()
                                .and_then(|s| s.tags.get(i))
                                .map(|t| t.name.clone())
                        });
                        ctx.notebook.set_tag_filter(tag);
                        ctx.overlays.tag_filter = false;
                        self.note_index = 0;
                        self.selected_id = None;
                        self.rederive(ctx);
                    }
                    InputMode::MoveNote => {
                        let folder = choice.and_then(|i| {
                            self.snapshot().and_then(|s| s.folders.get(i)).map(|f| f.id)
                        });
                        if let Some(id) = self.current_note().map(|n| n.id) {
                            match ctx.notebook.move_note(id, folder) {
                                Ok(()) => ctx.banner.show("Note moved"),
                                Err(e) => warn!("Failed to move note {}: {}", id, e),
                            }
                        }
                    }
                    _ => {}
                }
                self.input_mode = mode_for(ctx);
            }
            _ => {}
        }
    }

    /// y confirms, anything else cancels
    pub fn handle_confirm_key<S: EntityStore>(&mut self, press: KeyPress, ctx: &mut AppContext<S>) {
        let InputMode::Confirm(action) = self.input_mode else {
            return;
        };
        self.input_mode = mode_for(ctx);

        if !matches!(press.key, Key::Char('y') | Key::Char('Y')) {
            return;
        }

        match action {
            ConfirmAction::DeleteNote(id) => match ctx.notebook.delete_note(id) {
                Ok(()) => ctx.banner.show("Note deleted"),
                Err(e) => warn!("Failed to delete note {}: {}", id, e),
            },
            ConfirmAction::DeleteFolder(id) => match ctx.notebook.delete_folder(id) {
                Ok(()) => ctx.banner.show("Folder deleted"),
                Err(e) => warn!("Failed to delete folder {}: {}", id, e),
            },
        }
    }

    fn create_folder<S: EntityStore>(&mut self, ctx: &mut AppContext<S>) {
        let payload = match FolderForm::new().with_name(self.input.clone()).submit() {
            Ok(payload) => payload,
            Err(e) => {
                ctx.banner.show(e.to_string());
                return;
            }
        };
        match ctx.notebook.create_folder(payload) {
            Ok(_) => ctx.banner.show("Folder created"),
            Err(e) => warn!("Failed to create folder: {}", e),
        }
    }
}

/// The views shown above the folders
fn base_views() -> Vec<ViewSelector> {
    vec![
        ViewSelector::All,
        ViewSelector::Favorites,
        ViewSelector::Uncategorized,
    ]
}

/// Input mode implied by the overlays still open
fn mode_for<S>(ctx: &AppContext<S>) -> InputMode {
    if ctx.overlays.form {
        InputMode::NewFolder
    } else if ctx.overlays.search {
        InputMode::Search
    } else if ctx.overlays.tag_filter {
        InputMode::TagFilter
    } else {
        InputMode::Normal
    }
}
