//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its timestamp helpers.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `created_date <= modified_date` for every persisted note.
//! - An empty image path is normalized to `None`.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned note identifier (SQLite rowid).
pub type NoteId = i64;

/// Time source returning Unix epoch milliseconds.
///
/// Plain function pointer so tests can swap in fixed or stepping clocks.
pub type Clock = fn() -> i64;

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable identifier assigned on creation.
    pub id: NoteId,
    /// User-facing title. Non-blank when created through `NoteService`.
    pub title: String,
    /// Free-form body text, may be empty.
    pub content: String,
    /// Optional path to an attached image. Only the path is stored.
    pub image_path: Option<String>,
    /// Creation time in epoch milliseconds.
    pub created_date: i64,
    /// Last modification time in epoch milliseconds.
    pub modified_date: i64,
}

impl Note {
    /// Returns whether the note references an image.
    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }
}

/// Default clock backed by the system wall clock.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Normalizes an optional image path: trims it and maps blank to `None`.
pub fn normalize_image_path(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

/// Maps a persisted image path to its model value.
///
/// Blank becomes `None`; anything else is kept byte-for-byte.
pub fn stored_image_path(value: Option<&str>) -> Option<String> {
    value
        .filter(|path| !path.trim().is_empty())
        .map(str::to_string)
}
