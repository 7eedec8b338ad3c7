//! IdeaNote CLI
//!
//! Command-line and terminal interface for IdeaNote - notes, tags and folders.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ideanote_core::{Config, DocumentStore, Notebook};

mod commands;
mod editor;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ideanote")]
#[command(about = "IdeaNote - Local-first notes with tags and folders")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: Option<TagCommands>,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: Option<FolderCommands>,
    },
    /// Show or change the light/dark theme
    Theme {
        #[command(subcommand)]
        command: Option<ThemeCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (counts, storage, theme)
    Status,
    /// Merge a note document copied from another device
    Merge {
        /// Path to the other device's notes.automerge
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a new note
    #[command(alias = "create")]
    Add {
        /// Note body (opens editor if not provided)
        #[arg(short, long)]
        body: Option<String>,
        /// Note title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Card color (coral, white, blue, pink, gray, yellow, green, peach, lavender, mint)
        #[arg(short, long)]
        color: Option<String>,
        /// Folder name or ID
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// List notes, pinned first then newest
    #[command(alias = "ls")]
    List {
        /// View: all, favorites, uncategorized, or a folder name/ID
        #[arg(long)]
        view: Option<String>,
        /// Only notes whose text contains this (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
        /// Only notes with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Show a note
    Show {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Edit a note in $EDITOR
    Edit {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Pin or unpin a note
    Pin {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Mark or unmark a note as favorite
    #[command(alias = "favorite")]
    Fav {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Set a note's color, or advance to the next one
    Color {
        /// Note ID (full UUID or prefix)
        id: String,
        /// Color name (cycles when omitted)
        color: Option<String>,
    },
    /// Move a note to a folder (omit the folder to uncategorize)
    #[command(alias = "mv")]
    Move {
        /// Note ID (full UUID or prefix)
        id: String,
        /// Folder name or ID
        folder: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags with usage counts
    #[command(alias = "ls")]
    List,
    /// Add a tag
    Add {
        name: String,
    },
    /// Rename a tag on every note
    Rename {
        /// Tag name or ID
        tag: String,
        new_name: String,
    },
    /// Delete a tag and remove it from every note
    #[command(alias = "rm")]
    Delete {
        /// Tag name or ID
        tag: String,
    },
}

#[derive(Subcommand)]
enum FolderCommands {
    /// List folders with note counts
    #[command(alias = "ls")]
    List,
    /// Create a folder
    Add {
        name: String,
        /// Accent color (blue, green, purple, orange, pink, gray)
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Rename or recolor a folder
    #[command(alias = "edit")]
    Rename {
        /// Folder name or ID
        folder: String,
        new_name: String,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Delete a folder; its notes become uncategorized
    #[command(alias = "rm")]
    Delete {
        /// Folder name or ID
        folder: String,
    },
}

#[derive(Subcommand, Clone)]
enum ThemeCommands {
    /// Show the current theme
    Show,
    /// Set the theme (light or dark)
    Set { theme: String },
    /// Switch between light and dark
    Toggle,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, banner_timeout_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Handle TUI (default when no command given); it sets up its own logging
    if matches!(&cli.command, Some(Commands::Tui) | None) {
        return tui::run().await;
    }

    init_cli_logging();

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;

    if let Some(Commands::Theme { command }) = &cli.command {
        return handle_theme_command(command.clone(), &config, &output);
    }

    let store = DocumentStore::open(&config)
        .with_context(|| format!("Failed to open {:?}", config.document_path()))?;
    let mut notebook = Notebook::new(store);

    match cli.command {
        Some(Commands::Note { command }) => handle_note_command(command, &mut notebook, &output),
        Some(Commands::Tag { command }) => handle_tag_command(command, &mut notebook, &output),
        Some(Commands::Folder { command }) => {
            handle_folder_command(command, &mut notebook, &output)
        }
        Some(Commands::Status) => commands::status::show(&notebook, &config, &output),
        Some(Commands::Merge { file }) => {
            commands::merge::merge(notebook.store_mut(), file, &output)
        }
        // Handled above
        Some(Commands::Tui)
        | Some(Commands::Config { .. })
        | Some(Commands::Theme { .. })
        | None => Ok(()),
    }
}

/// Log to stderr for one-shot commands, off unless IDEANOTE_LOG is set
fn init_cli_logging() {
    let Ok(level) = std::env::var("IDEANOTE_LOG") else {
        return;
    };
    let filter = EnvFilter::new(format!("ideanote_core={level},ideanote_cli={level}"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_note_command(
    command: NoteCommands,
    notebook: &mut Notebook<DocumentStore>,
    output: &Output,
) -> Result<()> {
    match command {
        NoteCommands::Add {
            body,
            title,
            tag,
            color,
            folder,
        } => commands::note::create(notebook, body, title, tag, color, folder, output),
        NoteCommands::List { view, search, tag } => {
            commands::note::list(notebook, view, search, tag, output)
        }
        NoteCommands::Show { id } => commands::note::show(notebook, id, output),
        NoteCommands::Edit { id } => commands::note::edit(notebook, id, output),
        NoteCommands::Pin { id } => commands::note::pin(notebook, id, output),
        NoteCommands::Fav { id } => commands::note::favorite(notebook, id, output),
        NoteCommands::Color { id, color } => commands::note::color(notebook, id, color, output),
        NoteCommands::Move { id, folder } => commands::note::move_to(notebook, id, folder, output),
        NoteCommands::Delete { id } => commands::note::delete(notebook, id, output),
    }
}

fn handle_tag_command(
    command: Option<TagCommands>,
    notebook: &mut Notebook<DocumentStore>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(TagCommands::List) | None => commands::tag::list(notebook, output),
        Some(TagCommands::Add { name }) => commands::tag::add(notebook, name, output),
        Some(TagCommands::Rename { tag, new_name }) => {
            commands::tag::rename(notebook, tag, new_name, output)
        }
        Some(TagCommands::Delete { tag }) => commands::tag::delete(notebook, tag, output),
    }
}

fn handle_folder_command(
    command: Option<FolderCommands>,
    notebook: &mut Notebook<DocumentStore>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(FolderCommands::List) | None => commands::folder::list(notebook, output),
        Some(FolderCommands::Add { name, color }) => {
            commands::folder::add(notebook, name, color, output)
        }
        Some(FolderCommands::Rename {
            folder,
            new_name,
            color,
        }) => commands::folder::rename(notebook, folder, new_name, color, output),
        Some(FolderCommands::Delete { folder }) => {
            commands::folder::delete(notebook, folder, output)
        }
    }
}

fn handle_theme_command(
    command: Option<ThemeCommands>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ThemeCommands::Show) | None => commands::theme::show(config, output),
        Some(ThemeCommands::Set { theme }) => commands::theme::set(config, theme, output),
        Some(ThemeCommands::Toggle) => commands::theme::toggle(config, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
