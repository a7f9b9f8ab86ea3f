//! Note use-case service.
//!
//! # Responsibility
//! - Provide the create/update/delete/search/count entry points used by the
//!   presentation layer.
//! - Reject blank titles before they reach the store.
//! - Read back written notes so callers always see persisted state.
//!
//! # Invariants
//! - Titles are validated here, never in the store.
//! - Search with a blank query lists every note.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteDraft, NoteStore};
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over a store implementation.
pub struct NoteService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    /// Creates a service using the provided store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Gives read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives mutable access to the underlying store (used by the archiver).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Creates a note after validating its title.
    pub fn create_note(&self, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        validate_title(&draft.title)?;

        let id = self.store.create_note(&draft).inspect_err(|err| {
            error!("event=note_create module=service status=error error={err}");
        })?;
        info!(
            "event=note_create module=service status=ok note_id={id} has_image={}",
            draft.image_path.is_some()
        );

        self.store
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Replaces title, content and image path of an existing note.
    pub fn update_note(&self, id: NoteId, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        validate_title(&draft.title)?;

        self.store.update_note(id, &draft).inspect_err(|err| {
            error!("event=note_update module=service status=error note_id={id} error={err}");
        })?;
        info!("event=note_update module=service status=ok note_id={id}");

        self.store
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Deletes one note permanently.
    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        self.store.delete_note(id).inspect_err(|err| {
            error!("event=note_delete module=service status=error note_id={id} error={err}");
        })?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Gets one note, reporting a missing id as `NoteNotFound`.
    pub fn get_note(&self, id: NoteId) -> Result<Note, NoteServiceError> {
        self.store
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Lists notes whose title or content contains `query`.
    ///
    /// `None` and blank queries list the whole collection.
    pub fn search_notes(&self, query: Option<&str>) -> RepoResult<Vec<Note>> {
        let filter = query.filter(|value| !value.trim().is_empty());
        self.store.list_notes(filter)
    }

    /// Returns the number of stored notes.
    pub fn count_notes(&self) -> RepoResult<u64> {
        self.store.count_notes()
    }
}

fn validate_title(title: &str) -> Result<(), NoteServiceError> {
    if title.trim().is_empty() {
        return Err(NoteServiceError::EmptyTitle);
    }
    Ok(())
}
