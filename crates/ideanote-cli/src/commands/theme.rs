//! Theme command handlers

use anyhow::Result;

use ideanote_core::{Config, Theme, ThemeStore};

use crate::output::{Output, OutputFormat};

/// Show the stored theme
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let store = ThemeStore::load(config.preferences_path())?;
    print_theme(store.theme(), output);
    Ok(())
}

/// Set the theme explicitly
pub fn set(config: &Config, value: String, output: &Output) -> Result<()> {
    let theme: Theme = value.parse()?;
    let mut store = ThemeStore::load(config.preferences_path())?;
    store.set(theme)?;
    output.success(&format!("Theme set to {}", theme));
    Ok(())
}

/// Switch between light and dark
pub fn toggle(config: &Config, output: &Output) -> Result<()> {
    let mut store = ThemeStore::load(config.preferences_path())?;
    let theme = store.toggle()?;
    output.success(&format!("Theme set to {}", theme));
    Ok(())
}

fn print_theme(theme: Theme, output: &Output) {
    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "theme": theme })),
        OutputFormat::Quiet | OutputFormat::Human => println!("{}", theme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_set_then_toggle() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let output = Output::new(OutputFormat::Quiet);

        set(&config, "dark".to_string(), &output).unwrap();
        toggle(&config, &output).unwrap();

        let store = ThemeStore::load(config.preferences_path()).unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn test_set_rejects_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        assert!(set(&config, "sepia".to_string(), &Output::new(OutputFormat::Quiet)).is_err());
    }
}
