use docket_core::db::migrations::{latest_version, table_has_column};
use docket_core::db::{close_db, open_db, open_db_in_memory, DbError};
use chrono::{Duration, Local, NaiveDateTime, TimeZone};
use docket_core::{system_clock, NoteDraft, NoteStore, SqliteNoteStore};
use rusqlite::{params, Connection};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for column in [
        "id",
        "title",
        "content",
        "created_date",
        "modified_date",
        "image_path",
    ] {
        assert!(
            table_has_column(&conn, "notes", column).unwrap(),
            "notes.{column} is missing"
        );
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    close_db(conn_first).unwrap();

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    close_db(conn_second).unwrap();
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_in_missing_directory_reports_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("notes.db");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}

#[test]
fn legacy_database_without_image_path_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY,
            title TEXT,
            content TEXT,
            created_date TIMESTAMP,
            modified_date TIMESTAMP
        );
        INSERT INTO notes (title, content, created_date, modified_date)
        VALUES ('Groceries', NULL, '2024-03-01 09:15:42.123456', '2024-03-02 10:00:00.500000');",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    assert!(table_has_column(&conn, "notes", "image_path").unwrap());

    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let notes = store.list_notes(None).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Groceries");
    assert_eq!(notes[0].content, "");
    assert_eq!(notes[0].image_path, None);
    assert_eq!(
        notes[0].created_date,
        local_text_to_ms("2024-03-01 09:15:42.123456")
    );
    assert_eq!(
        notes[0].modified_date,
        local_text_to_ms("2024-03-02 10:00:00.500000")
    );
}

#[test]
fn legacy_note_written_just_now_is_not_dated_in_the_future() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy-now.db");
    let written = (Local::now() - Duration::minutes(1))
        .naive_local()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY,
            title TEXT,
            content TEXT,
            created_date TIMESTAMP,
            modified_date TIMESTAMP
        );",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO notes (title, content, created_date, modified_date)
         VALUES ('Legacy', '', ?1, ?1);",
        params![written],
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let legacy = store.get_note(1).unwrap().unwrap();
    assert!(legacy.modified_date <= system_clock());

    let fresh = store.create_note(&NoteDraft::new("Fresh", "", None)).unwrap();
    let titles = store
        .list_notes(None)
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, ["Fresh", "Legacy"]);

    let before_edit = system_clock();
    store.update_note(1, &NoteDraft::new("Legacy", "edited", None)).unwrap();
    let edited = store.get_note(1).unwrap().unwrap();
    assert!(edited.modified_date >= before_edit);
    assert_eq!(store.list_notes(None).unwrap()[1].id, fresh);
}

#[test]
fn legacy_database_that_already_has_image_path_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy-image.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY,
            title TEXT,
            content TEXT,
            created_date TIMESTAMP,
            modified_date TIMESTAMP,
            image_path TEXT
        );
        INSERT INTO notes (title, content, created_date, modified_date, image_path)
        VALUES ('Trip', 'beach', '2024-01-01 00:00:00.000000', '2024-01-01 00:00:00.000000', 'pics/beach.png');
        INSERT INTO notes (title, content, created_date, modified_date, image_path)
        VALUES ('Plain', '', '2024-01-01 00:00:00.000000', '2024-01-01 00:00:00.000000', NULL);",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let trip = store.get_note(1).unwrap().unwrap();
    let plain = store.get_note(2).unwrap().unwrap();
    assert_eq!(trip.image_path.as_deref(), Some("pics/beach.png"));
    assert_eq!(plain.image_path, None);
}

#[test]
fn store_rejects_unmigrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert!(SqliteNoteStore::try_new(&mut conn).is_err());
}

fn local_text_to_ms(text: &str) -> i64 {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").unwrap();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap()
        .timestamp_millis()
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
