//! Merge command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use ideanote_core::DocumentStore;

use crate::output::Output;

/// Merge another replica's document file into the local one
pub fn merge(store: &mut DocumentStore, file: PathBuf, output: &Output) -> Result<()> {
    let changed = store
        .merge_file(&file)
        .with_context(|| format!("Failed to merge {:?}", file))?;

    if changed {
        output.success(&format!("Merged changes from {}", file.display()));
    } else {
        output.message("Already up to date.");
    }
    Ok(())
}
