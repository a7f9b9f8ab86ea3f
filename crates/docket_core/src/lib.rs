//! Core domain logic for Docket.
//! This crate owns note persistence and snapshot backup; presentation layers
//! only call the store, service and archiver APIs re-exported here.

pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use backup::{ArchiveError, ArchiveResult, Archiver, ExportSummary, ImportOutcome};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{system_clock, Clock, Note, NoteId};
pub use repo::note_repo::{NoteDraft, NoteStore, SqliteNoteStore};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
