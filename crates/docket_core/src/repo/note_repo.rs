//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable create/update/delete/list/count over the `notes` table.
//! - Bulk-restore snapshot records with their original ids and timestamps.
//!
//! # Invariants
//! - Every mutating call is a single committed statement or transaction.
//! - `created_date` is written once; updates never move `modified_date`
//!   before it.
//! - Lists are ordered by `modified_date DESC, id DESC`.
//! - The store does not validate titles; that is a use-case concern.

use crate::model::note::{
    normalize_image_path, stored_image_path, system_clock, Clock, Note, NoteId,
};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    image_path,
    created_date,
    modified_date
FROM notes";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "title",
    "content",
    "image_path",
    "created_date",
    "modified_date",
];

/// Mutable note fields supplied by callers on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Blank values are stored as "no image".
    pub image_path: Option<String>,
}

impl NoteDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        image_path: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_path: normalize_image_path(image_path),
        }
    }
}

/// Repository interface for the durable note collection.
pub trait NoteStore {
    /// Persists a new note and returns its store-assigned id.
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Overwrites title/content/image and refreshes `modified_date`.
    fn update_note(&self, id: NoteId, draft: &NoteDraft) -> RepoResult<()>;
    /// Permanently removes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes, or those whose title/content contains `filter`.
    fn list_notes(&self, filter: Option<&str>) -> RepoResult<Vec<Note>>;
    /// Returns the number of stored notes.
    fn count_notes(&self) -> RepoResult<u64>;
    /// Inserts complete records verbatim in one transaction.
    fn restore_notes(&mut self, notes: &[Note]) -> RepoResult<usize>;
}

/// SQLite-backed note store borrowing a migrated connection.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn mut Connection,
    clock: Clock,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated connection using the system clock.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        Self::with_clock(conn, system_clock)
    }

    /// Constructs a store with an explicit time source.
    pub fn with_clock(conn: &'conn mut Connection, clock: Clock) -> RepoResult<Self> {
        ensure_notes_table_ready(conn)?;
        Ok(Self { conn, clock })
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        let now = (self.clock)();
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                image_path,
                created_date,
                modified_date
            ) VALUES (?1, ?2, ?3, ?4, ?4);",
            params![
                draft.title.as_str(),
                draft.content.as_str(),
                image_path_to_db(draft.image_path.as_deref()),
                now,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_note(&self, id: NoteId, draft: &NoteDraft) -> RepoResult<()> {
        let now = (self.clock)();
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                image_path = ?4,
                modified_date = MAX(?5, created_date)
             WHERE id = ?1;",
            params![
                id,
                draft.title.as_str(),
                draft.content.as_str(),
                image_path_to_db(draft.image_path.as_deref()),
                now,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let sql = format!("{NOTE_SELECT_SQL} WHERE id = ?1;");
        let note = self
            .conn
            .query_row(&sql, [id], parse_note_row)
            .optional()?;
        Ok(note)
    }

    fn list_notes(&self, filter: Option<&str>) -> RepoResult<Vec<Note>> {
        let pattern = filter
            .filter(|value| !value.is_empty())
            .map(|value| format!("%{}%", escape_like(value)));

        let mut sql = String::from(NOTE_SELECT_SQL);
        if pattern.is_some() {
            sql.push_str(" WHERE title LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\'");
        }
        sql.push_str(" ORDER BY modified_date DESC, id DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let notes = match pattern {
            Some(pattern) => stmt
                .query_map([pattern], parse_note_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], parse_note_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(notes)
    }

    fn count_notes(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count {count}")))
    }

    fn restore_notes(&mut self, notes: &[Note]) -> RepoResult<usize> {
        for note in notes {
            if note.created_date > note.modified_date {
                return Err(RepoError::InvalidData(format!(
                    "note {} has created_date {} after modified_date {}",
                    note.id, note.created_date, note.modified_date
                )));
            }
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO notes (
                    id,
                    title,
                    content,
                    image_path,
                    created_date,
                    modified_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for note in notes {
                stmt.execute(params![
                    note.id,
                    note.title.as_str(),
                    note.content.as_str(),
                    image_path_to_db(note.image_path.as_deref()),
                    note.created_date,
                    note.modified_date,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=notes_restore module=repo status=ok count={}",
            notes.len()
        );
        Ok(notes.len())
    }
}

/// Escapes `LIKE` wildcards so the filter matches as a literal substring.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn image_path_to_db(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let image_path: Option<String> = row.get("image_path")?;
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        image_path: stored_image_path(image_path.as_deref()),
        created_date: row.get("created_date")?,
        modified_date: row.get("modified_date")?,
    })
}

fn ensure_notes_table_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::InvalidData(
            "missing required table `notes`; open the database with db::open_db".to_string(),
        ));
    }

    for column in REQUIRED_COLUMNS {
        if !crate::db::migrations::table_has_column(conn, "notes", column)? {
            return Err(RepoError::InvalidData(format!(
                "missing required column `notes.{column}`"
            )));
        }
    }

    Ok(())
}
