//! Snapshot backup and restore for the note collection.
//!
//! # Responsibility
//! - Export every note to a portable JSON snapshot file.
//! - Repopulate an empty store from that snapshot at startup.
//!
//! # Invariants
//! - Export never mutates the store.
//! - Import only runs against an empty store and is all-or-nothing.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod archiver;
pub mod snapshot;

pub use archiver::{Archiver, ExportSummary, ImportOutcome};
pub use snapshot::{SnapshotRecord, SnapshotTimestamp};

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Snapshot export/import failure.
#[derive(Debug)]
pub enum ArchiveError {
    /// Reading or writing the snapshot file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Snapshot file is not a valid record array.
    Parse(serde_json::Error),
    /// Notes could not be encoded as JSON.
    Serialize(serde_json::Error),
    /// A structurally valid record carries unusable values.
    InvalidRecord { index: usize, reason: String },
    /// Store read or restore failed.
    Repo(RepoError),
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot I/O failed at `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "snapshot is malformed: {err}"),
            Self::Serialize(err) => write!(f, "snapshot encoding failed: {err}"),
            Self::InvalidRecord { index, reason } => {
                write!(f, "snapshot record #{index} is invalid: {reason}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) | Self::Serialize(err) => Some(err),
            Self::InvalidRecord { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ArchiveError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
