//! IdeaNote TUI
//!
//! Terminal user interface for IdeaNote.
//!
//! ## Layout
//!
//! Three panes:
//! - Left: Views (All Notes, Favorites, Uncategorized, then folders) with counts
//! - Middle: Notes in the active view, pinned first then newest
//! - Right: The selected note, rendered as plain text
//!
//! ## Keys
//!
//! - j/k or ↑/↓: Move selection
//! - Tab / Shift+Tab: Next / previous view
//! - a or Ctrl+N: New note ($EDITOR)
//! - e or Enter: Edit note ($EDITOR)
//! - d: Delete note
//! - p: Pin, s: Favorite, c: Color, m: Move to folder
//! - / or Ctrl+F: Search
//! - t: Filter by tag
//! - f: New folder, x: Delete the open folder
//! - T: Toggle light/dark theme
//! - Esc: Close the topmost panel
//! - ?: Help, q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ideanote_core::{
    AppContext, Config, Dispatch, EntityStore, Focus, Key, KeyPress, LiveQuery,
};

use app::{App, EditorTask, InputMode};

use crate::editor;

/// Run the TUI application
pub async fn run() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize TUI logging (file-based, only if IDEANOTE_LOG is set)
    init_tui_logging(&config);

    let mut ctx = AppContext::start(config)?;
    let mut updates = ctx.notebook.subscribe();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new();
    let initial = updates.borrow_and_update().clone();
    app.refresh(&mut ctx, initial);

    let result = run_app(&mut terminal, &mut app, &mut ctx, &mut updates).await;

    ctx.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend, S: EntityStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ctx: &mut AppContext<S>,
    updates: &mut watch::Receiver<LiveQuery>,
) -> Result<()> {
    loop {
        ctx.banner.tick(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app, ctx))?;

        tokio::select! {
            biased;

            // The store published a new snapshot (local commit or merge)
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Live query closed");
                    break;
                }
                let query = updates.borrow_and_update().clone();
                app.refresh(ctx, query);
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        if let Some(task) = handle_key(app, ctx, key) {
                            run_editor(terminal, app, ctx, task)?;
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Route a key press; returns an editor task if one was requested
fn handle_key<S: EntityStore>(
    app: &mut App,
    ctx: &mut AppContext<S>,
    key: KeyEvent,
) -> Option<EditorTask> {
    let press = to_key_press(key)?;

    // The load error screen has no actions; any key leaves
    if app.load_error().is_some() {
        app.should_quit = true;
        return None;
    }

    // If help is showing, any key dismisses it
    if app.show_help {
        app.show_help = false;
        return None;
    }

    match app.input_mode {
        InputMode::Confirm(_) => {
            app.handle_confirm_key(press, ctx);
            return None;
        }
        InputMode::TagFilter | InputMode::MoveNote => {
            app.handle_picker_key(press, ctx);
            return None;
        }
        _ => {}
    }

    let focus = if app.input_mode.is_text_input() {
        Focus::TextInput
    } else {
        Focus::Normal
    };

    match ctx.shortcuts.dispatch(&press, focus) {
        Dispatch::Handled(action) => app.perform(action, ctx),
        Dispatch::Passthrough => {
            if focus == Focus::TextInput {
                app.handle_text_key(press, ctx);
            } else if press.ctrl && press.key == Key::Char('c') {
                app.should_quit = true;
            }
            None
        }
    }
}

/// Translate a crossterm key event
fn to_key_press(event: KeyEvent) -> Option<KeyPress> {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Esc => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => return None,
    };

    let modifiers = event.modifiers;
    let shift = match key {
        // Shifted symbols arrive as their own character; some terminals
        // report uppercase letters without SHIFT
        Key::Char(c) if c.is_uppercase() => true,
        Key::Char(c) if !c.is_alphabetic() => false,
        Key::BackTab => false,
        _ => modifiers.contains(KeyModifiers::SHIFT),
    };

    Some(KeyPress {
        key,
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        meta: modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
        shift,
        alt: modifiers.contains(KeyModifiers::ALT),
    })
}

/// Hand the terminal to $EDITOR for a note, then save the result
fn run_editor<B: Backend, S: EntityStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ctx: &mut AppContext<S>,
    task: EditorTask,
) -> Result<()> {
    let note = match task {
        EditorTask::NewNote => None,
        EditorTask::EditNote(id) => match app.snapshot().and_then(|s| s.note(id)).cloned() {
            Some(note) => Some(note),
            None => return Ok(()),
        },
    };
    let template = editor::note_template(note.as_ref());

    ctx.overlays.form = true;

    // Exit TUI temporarily for editor
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    let edited = editor::edit_text(&template);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    terminal.clear()?;

    ctx.overlays.form = false;

    let content = match edited {
        Ok(content) => content,
        Err(e) => {
            warn!("Editor failed: {:#}", e);
            ctx.banner.show("Editor failed (see $EDITOR)");
            return Ok(());
        }
    };
    if content == template {
        ctx.banner.show("No changes");
        return Ok(());
    }

    let payload = match editor::parse_template(&content).and_then(|form| Ok(form.submit()?)) {
        Ok(payload) => payload,
        Err(e) => {
            ctx.banner.show(format!("Not saved: {}", e));
            return Ok(());
        }
    };

    let saved = match task {
        EditorTask::NewNote => ctx.notebook.create_note(payload).map(|_| ()),
        EditorTask::EditNote(id) => ctx.notebook.update_note(id, payload),
    };
    match saved {
        Ok(()) => ctx.banner.show("Note saved"),
        Err(e) => warn!("Failed to save note: {}", e),
    }

    Ok(())
}

/// Initialize logging for TUI mode
///
/// Only initializes if IDEANOTE_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("IDEANOTE_LOG") else {
        return;
    };

    let log_path = config.log_path();

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "ideanote_core={},ideanote_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
