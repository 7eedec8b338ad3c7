//! Command handlers

use anyhow::{bail, Result};
use uuid::Uuid;

pub mod config;
pub mod folder;
pub mod merge;
pub mod note;
pub mod status;
pub mod tag;
pub mod theme;

/// Resolve a full UUID or a unique prefix among `candidates`
///
/// `kind` names the record type in error messages, `label` renders a
/// candidate when the prefix is ambiguous.
pub(crate) fn resolve_id<T>(
    input: &str,
    kind: &str,
    candidates: &[T],
    id_of: impl Fn(&T) -> Uuid,
    label: impl Fn(&T) -> String,
) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(input) {
        return Ok(uuid);
    }

    let prefix = input.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        bail!("No {} ID given", kind);
    }

    let matches: Vec<&T> = candidates
        .iter()
        .filter(|c| id_of(c).to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, input),
        1 => Ok(id_of(matches[0])),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, input);
            for candidate in &matches {
                eprintln!("  {} - {}", id_of(candidate), label(candidate));
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
