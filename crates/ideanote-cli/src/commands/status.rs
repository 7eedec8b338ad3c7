//! Status command handler

use anyhow::Result;

use ideanote_core::{Config, EntityStore, Notebook, ThemeStore};

use crate::output::{Output, OutputFormat};

/// Show counts, storage location and theme
pub fn show<S: EntityStore>(notebook: &Notebook<S>, config: &Config, output: &Output) -> Result<()> {
    let snapshot = notebook.snapshot()?;
    let counts = notebook.counts()?;
    let theme = ThemeStore::load(config.preferences_path())?.theme();
    let document_path = config.document_path();
    let document_size = std::fs::metadata(&document_path)
        .map(|m| m.len())
        .unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "document": document_path,
                    "document_size": document_size,
                    "theme": theme,
                    "counts": {
                        "notes": counts.all,
                        "favorites": counts.favorites,
                        "uncategorized": counts.uncategorized,
                        "tags": snapshot.tags.len(),
                        "folders": snapshot.folders.len()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", counts.all);
        }
        OutputFormat::Human => {
            println!("IdeaNote Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Document: {} ({} bytes)", document_path.display(), document_size);
            println!();
            println!("Contents:");
            println!("  Notes:         {}", counts.all);
            println!("  Favorites:     {}", counts.favorites);
            println!("  Uncategorized: {}", counts.uncategorized);
            println!("  Tags:          {}", snapshot.tags.len());
            println!("  Folders:       {}", snapshot.folders.len());
            println!();
            println!("Theme: {}", theme);
        }
    }

    Ok(())
}
