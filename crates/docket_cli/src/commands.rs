//! Subcommand definitions and dispatch.

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use docket_core::logging::normalize_level;
use docket_core::{
    AppConfig, Archiver, ConfigError, Note, NoteDraft, NoteId, NoteService, NoteStore,
};
use std::path::PathBuf;

const CARD_DATE_FORMAT: &str = "%b %d, %Y";
const DETAIL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Personal notes backed by a local SQLite database.
#[derive(Debug, Parser)]
#[command(name = "docket", version)]
pub struct Cli {
    /// Database file (overrides DOCKET_DB_PATH).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Snapshot file used by `export` and startup restore (overrides DOCKET_SNAPSHOT_PATH).
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,
    /// Directory for rolling log files (overrides DOCKET_LOG_DIR).
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error (overrides DOCKET_LOG_LEVEL).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a note.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Path to an image to attach.
        #[arg(long)]
        image: Option<String>,
    },
    /// Change fields of an existing note; omitted fields keep their value.
    Edit {
        id: NoteId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,
        /// Detach the current image.
        #[arg(long)]
        clear_image: bool,
    },
    /// Print one note in full.
    Show { id: NoteId },
    /// Delete a note permanently.
    #[command(alias = "delete")]
    Rm { id: NoteId },
    /// List notes, most recently modified first.
    List {
        /// Only notes whose title or content contains this text.
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Print the number of notes.
    Count,
    /// Write every note to the snapshot file.
    Export,
}

impl Cli {
    /// Layers command-line flags over environment configuration.
    pub fn apply_overrides(&self, mut config: AppConfig) -> Result<AppConfig, ConfigError> {
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = snapshot.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = if log_dir.is_absolute() {
                log_dir.clone()
            } else {
                std::env::current_dir()
                    .map_err(ConfigError::CurrentDir)?
                    .join(log_dir)
            };
        }
        if let Some(level) = &self.log_level {
            config.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        }
        Ok(config)
    }
}

impl Command {
    /// Stable subcommand name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Edit { .. } => "edit",
            Command::Show { .. } => "show",
            Command::Rm { .. } => "rm",
            Command::List { .. } => "list",
            Command::Count => "count",
            Command::Export => "export",
        }
    }

    pub fn execute<S: NoteStore>(
        &self,
        service: &NoteService<S>,
        archiver: &Archiver,
    ) -> anyhow::Result<()> {
        match self {
            Command::Add {
                title,
                content,
                image,
            } => {
                let note = service.create_note(NoteDraft::new(
                    title.as_str(),
                    content.as_str(),
                    image.as_deref(),
                ))?;
                println!("Created note {}", note.id);
            }
            Command::Edit {
                id,
                title,
                content,
                image,
                clear_image,
            } => {
                let current = service.get_note(*id)?;
                let image_path = if *clear_image {
                    None
                } else {
                    image.as_deref().or(current.image_path.as_deref())
                };
                let draft = NoteDraft::new(
                    title.clone().unwrap_or(current.title.clone()),
                    content.clone().unwrap_or(current.content.clone()),
                    image_path,
                );
                let note = service.update_note(*id, draft)?;
                println!("Updated note {}", note.id);
            }
            Command::Show { id } => {
                let note = service.get_note(*id)?;
                print_note(&note);
            }
            Command::Rm { id } => {
                service.delete_note(*id)?;
                println!("Deleted note {id}");
            }
            Command::List { search } => {
                let notes = service.search_notes(search.as_deref())?;
                if notes.is_empty() {
                    println!("No notes.");
                }
                for note in &notes {
                    println!("{}", card_line(note));
                }
            }
            Command::Count => {
                println!("{}", service.count_notes()?);
            }
            Command::Export => {
                let summary = archiver
                    .export(service.store())
                    .context("failed to create backup")?;
                println!(
                    "Backed up {} note(s) to {}",
                    summary.notes,
                    summary.path.display()
                );
            }
        }
        Ok(())
    }
}

fn print_note(note: &Note) {
    println!("#{} {}", note.id, note.title);
    println!("created:  {}", format_epoch_ms(note.created_date, DETAIL_DATE_FORMAT));
    println!("modified: {}", format_epoch_ms(note.modified_date, DETAIL_DATE_FORMAT));
    if let Some(image) = &note.image_path {
        println!("image:    {image}");
    }
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
}

fn card_line(note: &Note) -> String {
    let marker = if note.has_image() { " [image]" } else { "" };
    format!(
        "{:>5}  {}  {}{marker}",
        note.id,
        format_epoch_ms(note.modified_date, CARD_DATE_FORMAT),
        note.title
    )
}

fn format_epoch_ms(epoch_ms: i64, format: &str) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|utc| utc.with_timezone(&Local).format(format).to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
