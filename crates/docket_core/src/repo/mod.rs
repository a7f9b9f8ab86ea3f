//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note store contract used by services and the archiver.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::note::NoteId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
