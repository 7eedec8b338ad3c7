//! Light/dark theme preference
//!
//! Stored under a single key in `preferences.toml`. On first run the
//! terminal's background is used to pick a default, which is then persisted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::atomic_write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => anyhow::bail!("Unknown theme: {} (expected light or dark)", other),
        }
    }
}

/// On-disk preferences file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(rename = "ideanoted-theme", default, skip_serializing_if = "Option::is_none")]
    theme: Option<Theme>,
}

/// Persisted theme preference
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
    theme: Theme,
}

impl ThemeStore {
    /// Load the preference, detecting and saving it on first run
    ///
    /// An unreadable preferences file falls back to the detected theme and
    /// is left as it is until the theme is next changed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored = match read_preferences(&path) {
            Ok(prefs) => prefs.theme,
            Err(e) => {
                let theme = detect_system_theme();
                warn!("{:#}; using {} theme", e, theme);
                return Ok(Self { path, theme });
            }
        };

        let store = match stored {
            Some(theme) => Self { path, theme },
            None => {
                let theme = detect_system_theme();
                debug!("No stored theme, detected {}", theme);
                let store = Self { path, theme };
                store.save()?;
                store
            }
        };
        Ok(store)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Switch between light and dark and persist
    pub fn toggle(&mut self) -> Result<Theme> {
        self.set(self.theme.toggle())?;
        Ok(self.theme)
    }

    pub fn set(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        self.save()
    }

    fn save(&self) -> Result<()> {
        let prefs = Preferences {
            theme: Some(self.theme),
        };
        let content = toml::to_string(&prefs).context("Failed to serialize preferences")?;
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save preferences to {:?}", self.path))
    }
}

fn read_preferences(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse preferences: {:?}", path))
}

/// Guess the terminal's theme from `COLORFGBG`
pub fn detect_system_theme() -> Theme {
    theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); the last field is the
/// background palette index. 7 and 9-15 are light backgrounds.
fn theme_from_colorfgbg(value: Option<&str>) -> Theme {
    let background = value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());

    match background {
        Some(0..=6) | Some(8) => Theme::Dark,
        _ => Theme::Light,
    }
}
