//! Snapshot export and conditional import.
//!
//! # Responsibility
//! - Write the whole note collection to the snapshot path, replacing it.
//! - Restore from the snapshot when, and only when, the store is empty.
//!
//! # Invariants
//! - Export writes a sibling temp file and renames it into place, so readers
//!   never observe a half-written snapshot.
//! - Import checks `count == 0` before looking at the file.
//! - Restored notes keep their snapshot ids and timestamps.

use crate::backup::snapshot::{decode_snapshot, encode_snapshot};
use crate::backup::{ArchiveError, ArchiveResult};
use crate::model::note::Note;
use crate::repo::note_repo::NoteStore;
use log::{error, info};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name used when no snapshot path is configured.
pub const DEFAULT_SNAPSHOT_FILE: &str = "notes_backup.json";

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of notes written.
    pub notes: usize,
    /// Snapshot file that now holds them.
    pub path: PathBuf,
}

/// Result of an import attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Store already holds notes; snapshot ignored.
    StoreNotEmpty,
    /// Store is empty but no snapshot file exists.
    NoSnapshot,
    /// Snapshot restored into the empty store.
    Imported { notes: usize },
}

/// Exports and restores note snapshots at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archiver {
    snapshot_path: PathBuf,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_FILE)
    }
}

impl Archiver {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Writes every note in `store` to the snapshot file.
    ///
    /// # Errors
    /// - `ArchiveError::Repo` when the store cannot be read.
    /// - `ArchiveError::Io` when the file cannot be written or moved into place.
    pub fn export<S: NoteStore>(&self, store: &S) -> ArchiveResult<ExportSummary> {
        info!(
            "event=snapshot_export module=backup status=start path={}",
            self.snapshot_path.display()
        );

        let result = store
            .list_notes(None)
            .map_err(ArchiveError::from)
            .and_then(|notes| {
                let body = encode_snapshot(&notes)?;
                self.write_atomically(&body)?;
                Ok(notes.len())
            });

        match result {
            Ok(count) => {
                info!(
                    "event=snapshot_export module=backup status=ok count={count} path={}",
                    self.snapshot_path.display()
                );
                Ok(ExportSummary {
                    notes: count,
                    path: self.snapshot_path.clone(),
                })
            }
            Err(err) => {
                error!("event=snapshot_export module=backup status=error error={err}");
                Err(err)
            }
        }
    }

    /// Restores the snapshot into `store` if the store is empty.
    ///
    /// # Errors
    /// - `ArchiveError::Io` / `Parse` / `InvalidRecord` when the snapshot
    ///   cannot be read or decoded. Nothing is imported in that case.
    /// - `ArchiveError::Repo` when counting or restoring fails; the restore
    ///   transaction is rolled back.
    pub fn import_if_empty<S: NoteStore>(&self, store: &mut S) -> ArchiveResult<ImportOutcome> {
        if store.count_notes()? > 0 {
            info!("event=snapshot_import module=backup status=skip reason=store_not_empty");
            return Ok(ImportOutcome::StoreNotEmpty);
        }

        let notes = match self.read_snapshot() {
            Ok(Some(notes)) => notes,
            Ok(None) => {
                info!("event=snapshot_import module=backup status=skip reason=no_snapshot");
                return Ok(ImportOutcome::NoSnapshot);
            }
            Err(err) => {
                error!("event=snapshot_import module=backup status=error error={err}");
                return Err(err);
            }
        };

        let restored = store.restore_notes(&notes).map_err(|err| {
            error!("event=snapshot_import module=backup status=error error={err}");
            ArchiveError::from(err)
        })?;
        info!("event=snapshot_import module=backup status=ok count={restored}");
        Ok(ImportOutcome::Imported { notes: restored })
    }

    /// Reads and decodes the snapshot, returning `None` when it does not exist.
    pub fn read_snapshot(&self) -> ArchiveResult<Option<Vec<Note>>> {
        let bytes = match fs::read(&self.snapshot_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ArchiveError::Io {
                    path: self.snapshot_path.clone(),
                    source,
                })
            }
        };
        decode_snapshot(&bytes).map(Some)
    }

    fn write_atomically(&self, body: &[u8]) -> ArchiveResult<()> {
        let temp_path = self.temp_path();
        if let Err(source) = fs::write(&temp_path, body) {
            let _ = fs::remove_file(&temp_path);
            return Err(ArchiveError::Io {
                path: temp_path,
                source,
            });
        }

        fs::rename(&temp_path, &self.snapshot_path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            ArchiveError::Io {
                path: self.snapshot_path.clone(),
                source,
            }
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .snapshot_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_SNAPSHOT_FILE));
        name.push(".tmp");
        self.snapshot_path.with_file_name(name)
    }
}
