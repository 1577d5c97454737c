//! Integration tests for the dbgrid-sqlite crate.

use std::path::{Path, PathBuf};

use dbgrid_core::IdentifierError;
use dbgrid_db::DatabaseError;
use dbgrid_sqlite::{AccessError, DatabaseHandle, ExecuteResult, SqlOutcome, Value};
use rusqlite::Connection;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Writes the `items` fixture: three rows, one NOT NULL column, one default.
fn items_db(dir: &Path) -> PathBuf {
    let path = dir.join("test.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             quantity INTEGER DEFAULT 0,
             price REAL
         );
         INSERT INTO items (name, quantity, price) VALUES ('Item A', 10, 1.5);
         INSERT INTO items (name, quantity, price) VALUES ('Item B', 20, 2.5);
         INSERT INTO items (name, quantity, price) VALUES ('Item C', 30, 3.5);",
    )
    .unwrap();
    drop(conn);
    path
}

fn open_items() -> (tempfile::TempDir, PathBuf, DatabaseHandle) {
    let dir = tempfile::tempdir().unwrap();
    let path = items_db(dir.path());
    let db = DatabaseHandle::open_path(&path).unwrap();
    (dir, path, db)
}

fn names(db: &DatabaseHandle) -> Vec<String> {
    db.query_all("SELECT name FROM items ORDER BY id", &[])
        .unwrap()
        .iter()
        .filter_map(|row| row.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_open_missing_file_any_extension() {
    let mut db = DatabaseHandle::new();
    for path in ["/nonexistent/file.db", "/nonexistent/file.txt", "/nonexistent/file"] {
        let err = db.open(path).unwrap_err();
        assert!(
            matches!(err, AccessError::Load(DatabaseError::NotFound(_))),
            "{path}: {err:?}"
        );
        assert!(err.to_string().contains("Database file not found"));
    }
    assert!(!db.is_open());
}

#[test]
fn test_operations_fail_after_close() {
    let (_dir, _path, mut db) = open_items();
    db.close();

    assert!(matches!(db.get_tables(), Err(AccessError::NotOpen)));
    assert!(matches!(db.get_table_info("items"), Err(AccessError::NotOpen)));
    assert!(matches!(db.get_table_data("items", 0, 10), Err(AccessError::NotOpen)));
    assert!(matches!(db.execute_sql("SELECT 1"), Err(AccessError::NotOpen)));
    assert!(matches!(db.query_all("SELECT 1", &[]), Err(AccessError::NotOpen)));
    assert!(matches!(db.execute("DELETE FROM items", &[]), Err(AccessError::NotOpen)));
    assert!(matches!(
        db.update_cell("items", 1, "name", Value::from("x")),
        Err(AccessError::NotOpen)
    ));
    assert!(matches!(db.delete_row("items", 1), Err(AccessError::NotOpen)));
    assert!(matches!(
        db.insert_row("items", &[("name", Value::from("x"))]),
        Err(AccessError::NotOpen)
    ));
    assert_eq!(db.get_tables().unwrap_err().to_string(), "Database not open");
}

#[test]
fn test_closed_handle_checks_state_before_identifiers() {
    let db = DatabaseHandle::new();
    assert!(matches!(db.delete_row("bad;name", 1), Err(AccessError::NotOpen)));
}

#[test]
fn test_reopen_switches_database() {
    let (dir, path, mut db) = open_items();
    let other = dir.path().join("other.sqlite3");
    Connection::open(&other)
        .unwrap()
        .execute_batch("CREATE TABLE widgets (x)")
        .unwrap();

    db.open(&other).unwrap();
    assert_eq!(db.get_tables().unwrap(), ["widgets"]);
    assert_eq!(db.path(), Some(other.as_path()));

    db.open(&path).unwrap();
    assert_eq!(db.get_tables().unwrap(), ["items"]);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[test]
fn test_get_tables() {
    let (_dir, _path, db) = open_items();
    assert_eq!(db.get_tables().unwrap(), ["items"]);
}

#[test]
fn test_get_table_info() {
    let (_dir, _path, db) = open_items();
    let info = db.get_table_info("items").unwrap();

    let names: Vec<&str> = info.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "name", "quantity", "price"]);

    let id = &info[0];
    assert!(id.is_primary_key);
    assert_eq!(id.declared_type, "INTEGER");

    let name = &info[1];
    assert!(name.not_null);
    assert!(!name.is_primary_key);

    assert_eq!(info[2].default_value, Value::from("0"));
}

#[test]
fn test_get_table_data_pagination() {
    let (_dir, _path, db) = open_items();

    let first = db.get_table_data("items", 0, 2).unwrap();
    assert_eq!(first.rows.len(), 2);
    assert_eq!(first.total, Some(3));
    assert_eq!(first.columns.len(), 4);

    let second = db.get_table_data("items", 1, 2).unwrap();
    assert_eq!(second.rows.len(), 1);
    assert_eq!(second.total, Some(3));
    assert_eq!(second.rows[0].get("name"), Some(&Value::from("Item C")));
}

#[test]
fn test_pages_cover_every_row_once() {
    let (_dir, _path, db) = open_items();
    for i in 0..8 {
        db.insert_row("items", &[("name", Value::from(format!("Extra {i}")))])
            .unwrap();
    }
    // Punch holes so rowids are not contiguous.
    db.delete_row("items", 2).unwrap();
    db.delete_row("items", 7).unwrap();

    let total = db.get_table_data("items", 0, 1).unwrap().total.unwrap();
    assert_eq!(total, 9);

    for page_size in [1usize, 2, 4, 5, 9, 20] {
        let pages = (total as usize).div_ceil(page_size);
        let mut seen = Vec::new();
        for page in 0..pages {
            let result = db.get_table_data("items", page, page_size).unwrap();
            assert!(result.rows.len() <= page_size);
            seen.extend(
                result
                    .rows
                    .iter()
                    .filter_map(|row| row.get("rowid").and_then(Value::as_i64)),
            );
        }
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(seen, sorted, "page_size {page_size}: order or duplicates");
        assert_eq!(seen.len() as u64, total, "page_size {page_size}");
    }
}

#[test]
fn test_get_first_page_uses_default_page_size() {
    let (_dir, _path, db) = open_items();
    let page = db.get_first_page("items").unwrap();
    assert_eq!(page.rows.len(), 3);
    assert_eq!(db.default_page_size(), 100);
}

#[test]
fn test_get_table_data_unknown_table_is_error() {
    let (_dir, _path, db) = open_items();
    let err = db.get_table_data("nonexistent", 0, 10).unwrap_err();
    assert!(matches!(err, AccessError::Engine(_)));
    assert!(err.to_string().contains("no such table"));
}

// ---------------------------------------------------------------------------
// Ad-hoc SQL
// ---------------------------------------------------------------------------

#[test]
fn test_execute_sql_select() {
    let (_dir, _path, db) = open_items();
    let SqlOutcome::Query(result) = db
        .execute_sql("  select name, price FROM items WHERE quantity > 15 ORDER BY id")
        .unwrap()
    else {
        panic!("expected a query result");
    };

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.total, None);
    let columns: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["name", "price"]);
}

#[test]
fn test_execute_sql_select_no_rows_has_no_columns() {
    let (_dir, _path, db) = open_items();
    let outcome = db.execute_sql("SELECT * FROM items WHERE id = 999").unwrap();
    let SqlOutcome::Query(result) = outcome else {
        panic!("expected a query result");
    };
    assert!(result.rows.is_empty());
    assert!(result.columns.is_empty());
}

#[test]
fn test_execute_sql_pragma_is_read() {
    let (_dir, _path, db) = open_items();
    let outcome = db.execute_sql("PRAGMA table_info(items)").unwrap();
    let SqlOutcome::Query(result) = outcome else {
        panic!("expected a query result");
    };
    assert_eq!(result.rows.len(), 4);
}

#[test]
fn test_execute_sql_write_persists() {
    let (_dir, path, db) = open_items();
    let outcome = db
        .execute_sql("INSERT INTO items (name, quantity) VALUES ('Item D', 40)")
        .unwrap();
    assert!(matches!(
        outcome,
        SqlOutcome::Execute(ExecuteResult::Applied { changes: 1 })
    ));

    let reloaded = DatabaseHandle::open_path(&path).unwrap();
    assert_eq!(reloaded.get_table_data("items", 0, 10).unwrap().total, Some(4));
}

#[test]
fn test_execute_sql_syntax_error_on_write_path_is_result() {
    let (_dir, _path, db) = open_items();
    let outcome = db.execute_sql("INSRT INTO items VALUES (1)").unwrap();
    let SqlOutcome::Execute(result) = outcome else {
        panic!("expected an execute result");
    };
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("syntax error"));
}

#[test]
fn test_execute_sql_empty_statement_is_reported() {
    let (_dir, path, db) = open_items();
    let before = std::fs::read(&path).unwrap();

    for sql in ["", "  ", "-- nothing to run"] {
        let outcome = db.execute_sql(sql).unwrap();
        let SqlOutcome::Execute(result) = outcome else {
            panic!("expected an execute result for {sql:?}");
        };
        assert_eq!(result.error(), Some("empty statement"), "{sql:?}");
    }
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_execute_sql_read_errors_propagate() {
    let (_dir, _path, db) = open_items();
    assert!(matches!(
        db.execute_sql("SELECT * FROM nonexistent"),
        Err(AccessError::Engine(_))
    ));
    assert!(matches!(db.execute_sql("SELEC * FROM items"), Ok(SqlOutcome::Execute(_))));
}

#[test]
fn test_failed_write_leaves_file_untouched() {
    let (_dir, path, db) = open_items();
    let before = std::fs::read(&path).unwrap();

    let outcome = db.execute_sql("DELETE FROM nonexistent").unwrap();
    assert!(matches!(outcome, SqlOutcome::Execute(ExecuteResult::Failed { .. })));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_execute_does_not_persist() {
    let (_dir, path, db) = open_items();
    let result = db.execute("DELETE FROM items", &[]).unwrap();
    assert_eq!(result.changes(), Some(3));

    let reloaded = DatabaseHandle::open_path(&path).unwrap();
    assert_eq!(reloaded.get_table_data("items", 0, 10).unwrap().total, Some(3));
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[test]
fn test_insert_row_increments_total() {
    let (_dir, _path, db) = open_items();
    let result = db
        .insert_row(
            "items",
            &[
                ("name", Value::from("Item D")),
                ("quantity", Value::Integer(5)),
                ("price", Value::Real(9.99)),
            ],
        )
        .unwrap();
    assert_eq!(result.changes(), Some(1));

    let page = db.get_table_data("items", 0, 10).unwrap();
    assert_eq!(page.total, Some(4));
    let row = page
        .rows
        .iter()
        .find(|row| row.get("name") == Some(&Value::from("Item D")))
        .unwrap();
    assert_eq!(row.get("quantity"), Some(&Value::Integer(5)));
    assert_eq!(row.get("price"), Some(&Value::Real(9.99)));
}

#[test]
fn test_insert_row_missing_not_null_column() {
    let (_dir, _path, db) = open_items();
    let result = db
        .insert_row("items", &[("quantity", Value::Integer(5))])
        .unwrap();

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("NOT NULL"));
    assert_eq!(db.get_table_data("items", 0, 10).unwrap().total, Some(3));
}

#[test]
fn test_delete_row() {
    let (_dir, _path, db) = open_items();
    let result = db.delete_row("items", 1).unwrap();
    assert_eq!(result.changes(), Some(1));
    assert_eq!(names(&db), ["Item B", "Item C"]);
}

#[test]
fn test_delete_nonexistent_row_is_not_an_error() {
    let (_dir, _path, db) = open_items();
    let result = db.delete_row("items", 999).unwrap();
    assert_eq!(result, ExecuteResult::Applied { changes: 0 });
    assert_eq!(db.get_table_data("items", 0, 10).unwrap().total, Some(3));
}

#[test]
fn test_update_cell() {
    let (_dir, _path, db) = open_items();
    let result = db
        .update_cell("items", 2, "name", Value::from("Renamed"))
        .unwrap();
    assert_eq!(result.changes(), Some(1));
    assert_eq!(names(&db), ["Item A", "Renamed", "Item C"]);
}

#[test]
fn test_update_cell_to_null() {
    let (_dir, _path, db) = open_items();
    db.update_cell("items", 1, "price", Value::Null).unwrap();

    let rows = db
        .query_all("SELECT price, typeof(price) AS kind FROM items WHERE id = 1", &[])
        .unwrap();
    assert_eq!(rows[0].get("price"), Some(&Value::Null));
    assert_eq!(rows[0].get("kind"), Some(&Value::from("null")));
}

#[test]
fn test_update_cell_constraint_violation_is_result() {
    let (_dir, _path, db) = open_items();
    let result = db.update_cell("items", 1, "name", Value::Null).unwrap();
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("NOT NULL"));
}

#[test]
fn test_update_cell_unknown_column_is_result() {
    let (_dir, _path, db) = open_items();
    let result = db
        .update_cell("items", 1, "colour", Value::from("red"))
        .unwrap();
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("no such column"));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn test_mutations_survive_reopen() {
    let (_dir, path, mut db) = open_items();
    db.update_cell("items", 1, "price", Value::Null).unwrap();
    db.update_cell("items", 2, "quantity", Value::Integer(-4))
        .unwrap();
    db.delete_row("items", 3).unwrap();
    db.insert_row(
        "items",
        &[("name", Value::from("Blob row")), ("price", Value::Real(0.125))],
    )
    .unwrap();

    let before = db.get_table_data("items", 0, 100).unwrap();
    db.close();

    let reopened = DatabaseHandle::open_path(&path).unwrap();
    let after = reopened.get_table_data("items", 0, 100).unwrap();
    assert_eq!(after.total, before.total);
    assert_eq!(after.rows, before.rows);
    assert_eq!(after.rows[0].get("price"), Some(&Value::Null));
}

#[test]
fn test_every_supported_extension_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.db", "b.sqlite", "c.sqlite3"] {
        let path = dir.path().join(name);
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (v TEXT)")
            .unwrap();

        let db = DatabaseHandle::open_path(&path).unwrap();
        db.insert_row("t", &[("v", Value::from(name))]).unwrap();
        drop(db);

        let db = DatabaseHandle::open_path(&path).unwrap();
        let rows = db.query_all("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0].get("v"), Some(&Value::from(name)), "{name}");
    }
}

#[test]
fn test_empty_file_gains_schema_after_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.db");
    std::fs::write(&path, b"").unwrap();

    let db = DatabaseHandle::open_path(&path).unwrap();
    assert!(db.get_tables().unwrap().is_empty());
    let outcome = db.execute_sql("CREATE TABLE fresh (x INTEGER)").unwrap();
    assert!(matches!(outcome, SqlOutcome::Execute(ExecuteResult::Applied { .. })));
    drop(db);

    let db = DatabaseHandle::open_path(&path).unwrap();
    assert_eq!(db.get_tables().unwrap(), ["fresh"]);
}

#[test]
fn test_persist_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = items_db(dir.path());
    let db = DatabaseHandle::open_path(&path).unwrap();

    // Replace the origin file with a directory so the write-back fails.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = db.delete_row("items", 1).unwrap_err();
    assert!(matches!(err, AccessError::Persist(_)));
    assert!(err.to_string().starts_with("failed to save database"));
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

#[test]
fn test_injection_attempts_rejected() {
    let (_dir, path, db) = open_items();
    let before = std::fs::read(&path).unwrap();

    let bad_tables = [r#"items"; DROP TABLE items; --"#, "it'ems", "items;"];
    for table in bad_tables {
        assert!(matches!(
            db.get_table_info(table),
            Err(AccessError::InvalidIdentifier(IdentifierError::Table(_)))
        ));
        assert!(matches!(
            db.get_table_data(table, 0, 10),
            Err(AccessError::InvalidIdentifier(IdentifierError::Table(_)))
        ));
        assert!(matches!(
            db.delete_row(table, 1),
            Err(AccessError::InvalidIdentifier(IdentifierError::Table(_)))
        ));
        assert!(matches!(
            db.update_cell(table, 1, "name", Value::from("x")),
            Err(AccessError::InvalidIdentifier(IdentifierError::Table(_)))
        ));
        assert!(matches!(
            db.insert_row(table, &[("name", Value::from("x"))]),
            Err(AccessError::InvalidIdentifier(IdentifierError::Table(_)))
        ));
    }

    let err = db
        .update_cell("items", 1, r#"name" = 'x'; --"#, Value::from("x"))
        .unwrap_err();
    assert!(matches!(err, AccessError::InvalidIdentifier(IdentifierError::Column(_))));
    assert!(err.to_string().starts_with("Invalid column name"));

    assert_eq!(names(&db), ["Item A", "Item B", "Item C"]);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_value_payloads_are_never_interpolated() {
    let (_dir, _path, db) = open_items();
    let payload = "x'); DROP TABLE items; --";
    db.update_cell("items", 1, "name", Value::from(payload)).unwrap();

    assert_eq!(db.get_tables().unwrap(), ["items"]);
    assert_eq!(names(&db)[0], payload);
}

#[test]
fn test_query_result_serializes_for_hosts() {
    let (_dir, _path, db) = open_items();
    let page = db.get_table_data("items", 1, 2).unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["total"], 3);
    assert_eq!(json["rows"][0]["name"], "Item C");
    assert_eq!(json["rows"][0]["rowid"], 3);
    assert_eq!(json["columns"][0]["pk"], true);
}
