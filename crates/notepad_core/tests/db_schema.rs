use notepad_core::db::migrations::{current_user_version, latest_version};
use notepad_core::db::{open_db, open_db_in_memory, DbError};
use notepad_core::{NoteQuery, NoteStore, NoteValues, StoreConfig, StoreError};
use rusqlite::Connection;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(1);

#[test]
fn open_db_in_memory_creates_notes_table() {
    let conn = open_db_in_memory(TIMEOUT).unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_eq!(
        table_columns(&conn, "notes"),
        ["id", "title", "body", "created_at", "modified_at"]
    );
}

#[test]
fn reopening_current_schema_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    {
        let store = NoteStore::open(&path, StoreConfig::default()).unwrap();
        let collection = store.routes().collection_uri();
        store
            .insert(&collection, NoteValues::new().title("kept"))
            .unwrap();
    }

    let store = NoteStore::open(&path, StoreConfig::default()).unwrap();
    let rows = store
        .query(&store.routes().collection_uri(), &NoteQuery::new())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.get_text(0, "title"), Some("kept"));
}

#[test]
fn older_schema_is_dropped_and_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (_id INTEGER PRIMARY KEY, title TEXT, note TEXT, created INTEGER, modified INTEGER);
         INSERT INTO notes (title, note, created, modified) VALUES ('old', 'body', 1, 1);
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path, TIMEOUT).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_eq!(
        table_columns(&conn, "notes"),
        ["id", "title", "body", "created_at", "modified_at"]
    );
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path, TIMEOUT).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = NoteStore::open(&path, StoreConfig::default())
        .err()
        .expect("store open should fail");
    assert!(matches!(
        err,
        StoreError::Db(DbError::UnsupportedSchemaVersion { .. })
    ));
}

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let rows = stmt.query_map([], |row| row.get::<_, String>(1)).unwrap();
    rows.map(Result::unwrap).collect()
}
