//! Application context
//!
//! Everything a front end needs, created on start and torn down on stop:
//! configuration, the notebook, theme preference, key bindings, overlay state
//! and the save banner.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::feedback::SaveBanner;
use crate::notebook::Notebook;
use crate::shortcuts::{default_shortcuts, Action, Overlays, ShortcutMap};
use crate::store::{DocumentStore, EntityStore};
use crate::theme::ThemeStore;

pub struct AppContext<S> {
    pub config: Config,
    pub notebook: Notebook<S>,
    pub theme: ThemeStore,
    pub shortcuts: ShortcutMap<Action>,
    pub overlays: Overlays,
    pub banner: SaveBanner,
}

impl AppContext<DocumentStore> {
    /// Open the persisted store and theme for the given configuration
    pub fn start(config: Config) -> Result<Self> {
        let store = DocumentStore::open(&config).with_context(|| {
            format!("Failed to open note document at {:?}", config.document_path())
        })?;
        let theme = ThemeStore::load(config.preferences_path())?;
        Ok(Self::with_store(config, store, theme))
    }
}

impl<S: EntityStore> AppContext<S> {
    /// Assemble a context around an existing store
    pub fn with_store(config: Config, store: S, theme: ThemeStore) -> Self {
        let banner = SaveBanner::new(config.banner_timeout());
        info!("Starting IdeaNote (theme: {})", theme.theme());
        Self {
            config,
            notebook: Notebook::new(store),
            theme,
            shortcuts: default_shortcuts(),
            overlays: Overlays::default(),
            banner,
        }
    }

    /// Stop timers and key handling
    pub fn shutdown(&mut self) {
        self.banner.clear();
        self.shortcuts.set_enabled(false);
        self.overlays = Overlays::default();
        info!("IdeaNote stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::NoteForm;
    use crate::shortcuts::{Dispatch, Focus, Key, KeyPress};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            log_file: None,
            banner_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_start_and_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = AppContext::start(test_config(&temp_dir)).unwrap();

        let id = ctx
            .notebook
            .create_note(NoteForm::new().with_text("hello").submit().unwrap())
            .unwrap();
        ctx.banner.show("Note saved");
        assert_eq!(ctx.banner.timeout().as_millis(), 1000);
        assert!(temp_dir.path().join("notes.automerge").exists());
        assert!(temp_dir.path().join("preferences.toml").exists());

        ctx.shutdown();
        assert!(!ctx.banner.is_visible());
        assert_eq!(
            ctx.shortcuts
                .dispatch(&KeyPress::new(Key::Escape), Focus::Normal),
            Dispatch::Passthrough
        );

        // A fresh start sees the saved note
        let ctx = AppContext::start(test_config(&temp_dir)).unwrap();
        assert!(ctx.notebook.snapshot().unwrap().note(id).is_some());
    }
}
