//! Snapshot wire format.
//!
//! A snapshot is a JSON array of flat note records. Timestamps are written as
//! epoch milliseconds; text timestamps produced by the original desktop app
//! (`2024-03-01 09:15:42.123456`) are still accepted on read and taken as
//! local wall-clock time, which is how that app wrote them.
//! `image_path` may be missing or `null` in older snapshots.

use crate::backup::{ArchiveError, ArchiveResult};
use crate::model::note::{stored_image_path, Note, NoteId};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

const LEGACY_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// One note as stored in the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_date: SnapshotTimestamp,
    pub modified_date: SnapshotTimestamp,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Timestamp field accepting both current and legacy encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotTimestamp {
    /// Unix epoch milliseconds.
    Millis(i64),
    /// Naive `YYYY-MM-DD HH:MM:SS[.ffffff]` or RFC 3339 text.
    Text(String),
}

impl SnapshotTimestamp {
    /// Resolves the timestamp to epoch milliseconds.
    pub fn to_epoch_ms(&self) -> Result<i64, String> {
        match self {
            Self::Millis(value) => Ok(*value),
            Self::Text(text) => parse_text_timestamp(text),
        }
    }
}

impl SnapshotRecord {
    /// Captures every attribute of a note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            created_date: SnapshotTimestamp::Millis(note.created_date),
            modified_date: SnapshotTimestamp::Millis(note.modified_date),
            image_path: Some(note.image_path.clone().unwrap_or_default()),
        }
    }

    /// Converts the record back into a note, validating its timestamps.
    ///
    /// `index` is the record's position in the file, used for error reports.
    pub fn into_note(self, index: usize) -> ArchiveResult<Note> {
        let invalid = |reason: String| ArchiveError::InvalidRecord { index, reason };

        let created_date = self
            .created_date
            .to_epoch_ms()
            .map_err(|reason| invalid(format!("created_date: {reason}")))?;
        let modified_date = self
            .modified_date
            .to_epoch_ms()
            .map_err(|reason| invalid(format!("modified_date: {reason}")))?;
        if created_date > modified_date {
            return Err(invalid(format!(
                "created_date {created_date} is after modified_date {modified_date}"
            )));
        }

        Ok(Note {
            id: self.id,
            title: self.title,
            content: self.content,
            image_path: stored_image_path(self.image_path.as_deref()),
            created_date,
            modified_date,
        })
    }
}

/// Decodes a snapshot file body into notes.
///
/// Any structural problem fails the whole file; nothing is partially decoded.
pub fn decode_snapshot(bytes: &[u8]) -> ArchiveResult<Vec<Note>> {
    let records: Vec<SnapshotRecord> =
        serde_json::from_slice(bytes).map_err(ArchiveError::Parse)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_note(index))
        .collect()
}

/// Encodes notes as a pretty-printed snapshot body.
pub fn encode_snapshot(notes: &[Note]) -> ArchiveResult<Vec<u8>> {
    let records = notes.iter().map(SnapshotRecord::from_note).collect::<Vec<_>>();
    serde_json::to_vec_pretty(&records).map_err(ArchiveError::Serialize)
}

fn parse_text_timestamp(text: &str) -> Result<i64, String> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }
    for format in LEGACY_TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Local
                .from_local_datetime(&parsed)
                .earliest()
                .map(|local| local.timestamp_millis())
                .ok_or_else(|| format!("`{trimmed}` does not exist in the local time zone"));
        }
    }
    Err(format!("unrecognized timestamp `{trimmed}`"))
}
