use docket_core::db::open_db_in_memory;
use docket_core::{Note, NoteDraft, NoteStore, RepoError, SqliteNoteStore};
use rusqlite::params;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

static TICKS: AtomicI64 = AtomicI64::new(1_700_000_000_000);

fn stepping_clock() -> i64 {
    TICKS.fetch_add(1_000, Ordering::SeqCst)
}

fn frozen_clock() -> i64 {
    1_700_000_000_000
}

fn draft(title: &str, content: &str) -> NoteDraft {
    NoteDraft::new(title, content, None)
}

#[test]
fn groceries_scenario_create_update_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::with_clock(&mut conn, stepping_clock).unwrap();

    let id = store.create_note(&draft("Groceries", "Milk, eggs")).unwrap();
    assert_eq!(id, 1);
    let listed = store.list_notes(None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Groceries");
    let created = listed[0].clone();

    store
        .update_note(1, &draft("Groceries", "Milk, eggs, bread"))
        .unwrap();
    let listed = store.list_notes(None).unwrap();
    assert_eq!(listed[0].content, "Milk, eggs, bread");
    assert!(listed[0].modified_date > created.modified_date);
    assert_eq!(listed[0].created_date, created.created_date);
    assert_eq!(listed[0].id, created.id);

    store.delete_note(1).unwrap();
    assert!(store.list_notes(None).unwrap().is_empty());
    assert_eq!(store.count_notes().unwrap(), 0);
}

#[test]
fn create_sets_equal_timestamps_and_unique_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::with_clock(&mut conn, stepping_clock).unwrap();

    let mut ids = HashSet::new();
    for idx in 0..20 {
        let id = store
            .create_note(&draft(&format!("note {idx}"), "body"))
            .unwrap();
        assert!(ids.insert(id), "duplicate id {id}");
        let note = store.get_note(id).unwrap().unwrap();
        assert_eq!(note.created_date, note.modified_date);
    }
    assert_eq!(store.count_notes().unwrap(), 20);
}

#[test]
fn update_under_frozen_clock_keeps_modified_date_equal() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::with_clock(&mut conn, frozen_clock).unwrap();

    let id = store.create_note(&draft("t", "c")).unwrap();
    store.update_note(id, &draft("t2", "c2")).unwrap();
    let note = store.get_note(id).unwrap().unwrap();
    assert_eq!(note.title, "t2");
    assert_eq!(note.created_date, frozen_clock());
    assert_eq!(note.modified_date, frozen_clock());
}

#[test]
fn update_never_moves_modified_before_created() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let store = SqliteNoteStore::with_clock(&mut conn, frozen_clock).unwrap();
        store.create_note(&draft("t", "c")).unwrap()
    };

    fn clock_in_the_past() -> i64 {
        1_000
    }
    let store = SqliteNoteStore::with_clock(&mut conn, clock_in_the_past).unwrap();
    store.update_note(id, &draft("t", "changed")).unwrap();
    let note = store.get_note(id).unwrap().unwrap();
    assert_eq!(note.modified_date, note.created_date);
}

#[test]
fn update_and_delete_of_missing_id_report_not_found_without_changes() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    store.create_note(&draft("keep", "me")).unwrap();

    let err = store.update_note(42, &draft("x", "y")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)));
    let err = store.delete_note(42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)));

    assert_eq!(store.count_notes().unwrap(), 1);
    assert_eq!(store.list_notes(None).unwrap()[0].title, "keep");
}

#[test]
fn delete_decrements_count_by_one() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let first = store.create_note(&draft("a", "")).unwrap();
    store.create_note(&draft("b", "")).unwrap();

    store.delete_note(first).unwrap();
    assert_eq!(store.count_notes().unwrap(), 1);
    assert!(store
        .list_notes(None)
        .unwrap()
        .iter()
        .all(|note| note.id != first));
}

#[test]
fn list_orders_by_modified_date_descending() {
    let mut conn = open_db_in_memory().unwrap();
    let (first, second, third) = {
        let store = SqliteNoteStore::with_clock(&mut conn, stepping_clock).unwrap();
        (
            store.create_note(&draft("first", "")).unwrap(),
            store.create_note(&draft("second", "")).unwrap(),
            store.create_note(&draft("third", "")).unwrap(),
        )
    };

    conn.execute(
        "UPDATE notes SET modified_date = 9000000000000 WHERE id = ?1;",
        params![first],
    )
    .unwrap();

    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let ids = ids_of(&store.list_notes(None).unwrap());
    assert_eq!(ids, vec![first, third, second]);
}

#[test]
fn list_filter_matches_title_or_content_case_insensitively() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::with_clock(&mut conn, stepping_clock).unwrap();
    let groceries = store.create_note(&draft("Groceries", "Milk, eggs")).unwrap();
    let recipe = store
        .create_note(&draft("Pancakes", "Needs MILK and flour"))
        .unwrap();
    store.create_note(&draft("Workout", "Run 5k")).unwrap();

    let ids = ids_of(&store.list_notes(Some("milk")).unwrap());
    assert_eq!(ids, vec![recipe, groceries]);

    let ids = ids_of(&store.list_notes(Some("GROC")).unwrap());
    assert_eq!(ids, vec![groceries]);

    assert!(store.list_notes(Some("absent")).unwrap().is_empty());
    assert_eq!(store.list_notes(Some("")).unwrap().len(), 3);
}

#[test]
fn list_filter_treats_like_wildcards_literally() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::with_clock(&mut conn, stepping_clock).unwrap();
    let sale = store.create_note(&draft("Sale", "50% off")).unwrap();
    store.create_note(&draft("Plain", "50 percent")).unwrap();
    let snake = store.create_note(&draft("snake_case", "")).unwrap();

    assert_eq!(ids_of(&store.list_notes(Some("50%")).unwrap()), vec![sale]);
    assert_eq!(ids_of(&store.list_notes(Some("e_c")).unwrap()), vec![snake]);
}

#[test]
fn image_path_is_persisted_and_blank_means_none() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let with_image = store
        .create_note(&NoteDraft::new("Trip", "", Some("pics/beach.png")))
        .unwrap();
    let without = store
        .create_note(&NoteDraft::new("Plain", "", Some("")))
        .unwrap();

    assert_eq!(
        store.get_note(with_image).unwrap().unwrap().image_path.as_deref(),
        Some("pics/beach.png")
    );
    assert_eq!(store.get_note(without).unwrap().unwrap().image_path, None);

    store
        .update_note(with_image, &NoteDraft::new("Trip", "", None))
        .unwrap();
    assert!(!store.get_note(with_image).unwrap().unwrap().has_image());
}

#[test]
fn restore_preserves_ids_and_timestamps() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let notes = vec![
        Note {
            id: 7,
            title: "seven".to_string(),
            content: "".to_string(),
            image_path: Some("seven.png".to_string()),
            created_date: 100,
            modified_date: 300,
        },
        Note {
            id: 3,
            title: "three".to_string(),
            content: "body".to_string(),
            image_path: None,
            created_date: 200,
            modified_date: 200,
        },
    ];

    assert_eq!(store.restore_notes(&notes).unwrap(), 2);
    assert_eq!(store.list_notes(None).unwrap(), notes);

    let next = store.create_note(&draft("next", "")).unwrap();
    assert_eq!(next, 8);
}

#[test]
fn restore_is_all_or_nothing_on_duplicate_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteNoteStore::try_new(&mut conn).unwrap();
    let note = Note {
        id: 1,
        title: "dup".to_string(),
        content: String::new(),
        image_path: None,
        created_date: 1,
        modified_date: 1,
    };

    let err = store
        .restore_notes(&[note.clone(), note])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(store.count_notes().unwrap(), 0);
}

#[test]
fn restore_keeps_image_path_verbatim() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteNoteStore::with_clock(&mut conn, frozen_clock).unwrap();
    let note = Note {
        id: 5,
        title: "Scan".to_string(),
        content: String::new(),
        image_path: Some("  scans/page 1.png ".to_string()),
        created_date: 10,
        modified_date: 20,
    };

    store.restore_notes(std::slice::from_ref(&note)).unwrap();
    assert_eq!(store.get_note(5).unwrap(), Some(note));
}

fn ids_of(notes: &[Note]) -> Vec<i64> {
    notes.iter().map(|note| note.id).collect()
}
