//! Raw-SQL escape hatch and string-typed columns: write a row, rewrite it
//! with `execute_sql`, and read every column back by position.

use std::time::{SystemTime, UNIX_EPOCH};

use relstore_core::{LogicalLocation, Policy};
use relstore_storage::DbStorage;
use tempfile::TempDir;

#[test]
fn write_update_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let loc = LogicalLocation::new(format!("sqlite:{}", path.display()));

    let mut dbs = DbStorage::new();
    dbs.set_policy(Policy::new());
    dbs.set_persist_location(&loc).unwrap();
    dbs.execute_sql(
        "CREATE TABLE DbStorage_Test_1 (
             id INTEGER,
             ra DOUBLE,
             decl DOUBLE,
             something INTEGER,
             final TEXT
         )",
    )
    .unwrap();

    let test_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64;

    // Write a row.
    dbs.start_transaction().unwrap();

    dbs.set_table_for_insert("DbStorage_Test_1");
    dbs.set_column("id", test_id);
    dbs.set_column("ra", 12345.0);
    dbs.set_column("decl", 9876.0);
    dbs.set_column_to_null("something");
    dbs.set_column("final", "bar".to_string());
    dbs.insert_row().unwrap();

    dbs.execute_sql(&format!(
        "UPDATE DbStorage_Test_1 SET ra = 9876.0, decl = 12345.0, final = 'foo'
         WHERE id = {test_id}"
    ))
    .unwrap();

    dbs.end_transaction().unwrap();

    // Get it back.
    dbs.set_retrieve_location(&loc).unwrap();

    dbs.start_transaction().unwrap();

    dbs.set_table_for_query("DbStorage_Test_1");

    dbs.out_column("decl");
    dbs.out_column("id");
    dbs.out_column("something");
    dbs.out_column("final");
    dbs.out_column("ra");

    dbs.cond_param("id", test_id);
    dbs.set_query_where("id = :id");

    dbs.query().unwrap();

    assert!(dbs.next().unwrap());

    assert!(!dbs.column_is_null(0).unwrap());
    assert!(!dbs.column_is_null(1).unwrap());
    assert!(dbs.column_is_null(2).unwrap());
    assert!(!dbs.column_is_null(3).unwrap());
    assert!(!dbs.column_is_null(4).unwrap());
    assert_eq!(dbs.get_column_by_pos::<i64>(1).unwrap(), test_id);
    assert_eq!(dbs.get_column_by_pos::<f64>(0).unwrap(), 12345.0);
    assert_eq!(dbs.get_column_by_pos::<String>(3).unwrap(), "foo");
    assert_eq!(dbs.get_column_by_pos::<f64>(4).unwrap(), 9876.0);

    assert!(!dbs.next().unwrap());

    dbs.finish_query();

    dbs.end_transaction().unwrap();
}

#[test]
fn overwriting_a_staged_column_keeps_the_last_value() {
    let dir = TempDir::new().unwrap();
    let loc = LogicalLocation::new(format!("sqlite:{}", dir.path().join("t.db").display()));

    let mut dbs = DbStorage::new();
    dbs.set_persist_location(&loc).unwrap();
    dbs.execute_sql("CREATE TABLE t (id INTEGER, note TEXT)").unwrap();

    dbs.start_transaction().unwrap();
    dbs.set_table_for_insert("t");
    dbs.set_column("id", 1i64);
    dbs.set_column("note", "first".to_string());
    dbs.set_column("note", "second".to_string());
    dbs.insert_row().unwrap();
    dbs.end_transaction().unwrap();

    dbs.set_table_for_query("t");
    dbs.out_column("note");
    dbs.query().unwrap();
    assert!(dbs.next().unwrap());
    assert_eq!(dbs.get_column_by_pos::<String>(0).unwrap(), "second");
    assert!(!dbs.next().unwrap());
}
