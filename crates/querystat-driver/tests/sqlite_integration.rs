//! Integration tests for the SQLite adapter.

use std::sync::Arc;
use std::time::Duration;

use querystat_core::{new_shared_counter, QueryCounter, RowCounts, SharedQueryCounter};
use querystat_driver::{AdapterConfig, Instrumented, SqliteAdapter};

fn setup() -> (SqliteAdapter, SharedQueryCounter) {
    let adapter = SqliteAdapter::open_in_memory().unwrap();
    adapter
        .connection()
        .execute_batch(
            r#"
            CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER NOT NULL);
            INSERT INTO user (id, name, age) VALUES (1, 'ada', 36), (2, 'alan', 41), (3, 'grace', 85);
            "#,
        )
        .unwrap();

    let counter = new_shared_counter();
    assert!(adapter.register(counter.clone()).unwrap());
    (adapter, counter)
}

#[test]
fn test_reads_record_fetched_rows() {
    let (adapter, counter) = setup();

    let names: Vec<String> = adapter
        .query_map("SELECT name FROM user WHERE age > 40", [], |row| row.get(0))
        .unwrap();
    assert_eq!(names.len(), 2);

    let names: Vec<String> = adapter
        .query_map("SELECT name FROM user WHERE age > 80", [], |row| row.get(0))
        .unwrap();
    assert_eq!(names, vec!["grace".to_string()]);

    let m = counter.get("SELECT name FROM user WHERE age > ?").unwrap();
    assert_eq!(m.success_count, 2);
    assert_eq!(m.fetched_rows, 3);
    assert_eq!(counter.running_queries_count(), 0);
}

#[test]
fn test_writes_record_changed_rows() {
    let (adapter, counter) = setup();

    let changed = adapter
        .execute("UPDATE user SET age = age + 1 WHERE age < 50", [])
        .unwrap();
    assert_eq!(changed, 2);

    let m = counter.get("UPDATE user SET age = age + ? WHERE age < ?").unwrap();
    assert_eq!(m.success_count, 1);
    assert_eq!(m.affected_rows, 2);
    assert_eq!(m.changed_rows, 2);
    assert_eq!(m.fetched_rows, 0);
}

#[test]
fn test_bound_parameters_share_a_record() {
    let (adapter, counter) = setup();

    for id in 1..=3 {
        let age: i64 = adapter
            .query_row("SELECT age FROM user WHERE id = ?1", [id], |row| row.get(0))
            .unwrap();
        assert!(age > 0);
    }

    let m = counter.get("SELECT age FROM user WHERE id = ?").unwrap();
    assert_eq!(m.success_count, 3);
    assert_eq!(m.fetched_rows, 3);
}

#[test]
fn test_driver_error_is_unchanged() {
    let (adapter, counter) = setup();

    let direct = adapter
        .connection()
        .execute("INSERT INTO missing (a) VALUES (1)", [])
        .unwrap_err();
    let instrumented = adapter
        .execute("INSERT INTO missing (a) VALUES (1)", [])
        .unwrap_err();

    assert_eq!(direct.to_string(), instrumented.to_string());
    assert!(matches!(instrumented, rusqlite::Error::SqliteFailure(..)));

    let m = counter.get("INSERT INTO missing (a) VALUES (?)").unwrap();
    assert_eq!(m.error_count, 1);
    assert_eq!(m.success_count, 0);
    assert_eq!(counter.running_queries_count(), 0);
}

#[test]
fn test_double_registration_does_not_double_count() {
    let (adapter, counter) = setup();
    let other = new_shared_counter();

    assert!(!adapter.register(counter.clone()).unwrap());
    assert!(!adapter.register(other.clone()).unwrap());

    adapter.execute("DELETE FROM user WHERE id = 3", []).unwrap();

    assert_eq!(
        counter.get("DELETE FROM user WHERE id = ?").unwrap().success_count,
        1
    );
    assert!(other.metrics().is_empty());
}

#[test]
fn test_run_mixed_statements() {
    let (adapter, counter) = setup();

    let output = adapter.run("SELECT id, name FROM user ORDER BY id").unwrap();
    assert_eq!(output.columns, vec!["id".to_string(), "name".to_string()]);
    assert_eq!(output.rows[0], vec!["1".to_string(), "ada".to_string()]);

    let output = adapter.run("DELETE FROM user WHERE age > 40").unwrap();
    assert!(output.columns.is_empty());
    assert_eq!(output.changes, 2);

    let write = counter.get("DELETE FROM user WHERE age > ?").unwrap();
    assert_eq!(write.affected_rows, 2);
    let read = counter.get("SELECT id, name FROM user ORDER BY id").unwrap();
    assert_eq!(read.fetched_rows, 3);
}

#[test]
fn test_calibration_feeds_counter_but_not_metrics() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::with_config(
        conn,
        AdapterConfig::new()
            .with_calibration_samples(4)
            .with_calibrate_on_register(true),
    );
    let counter = new_shared_counter();

    assert!(adapter.register(counter.clone()).unwrap());

    assert!(counter.calibrated_latency().is_some());
    assert!(counter.metrics().is_empty());
    assert_eq!(counter.running_queries_count(), 0);

    let best = adapter.calibrate(3).unwrap().unwrap();
    assert!(counter.calibrated_latency().unwrap() <= best);
    assert_eq!(adapter.calibrate(0).unwrap(), None);
}

#[test]
fn test_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");

    {
        let adapter = SqliteAdapter::open(&path).unwrap();
        adapter
            .execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)")
            .unwrap();
    }

    let adapter = SqliteAdapter::open(&path).unwrap();
    let counter = new_shared_counter();
    adapter.register(counter.clone()).unwrap();
    adapter
        .execute("INSERT INTO kv (k, v) VALUES ('a', 'b')", [])
        .unwrap();

    let m = counter.get("INSERT INTO kv (k, v) VALUES (?, ?)").unwrap();
    assert_eq!(m.affected_rows, 1);
}

#[derive(Debug, thiserror::Error)]
#[error("remote failure")]
struct RemoteError;

#[tokio::test]
async fn test_async_dispatch_records_result() {
    let conn = Instrumented::new(());
    let counter = Arc::new(QueryCounter::new());
    conn.register(counter.clone());

    let rows = conn
        .dispatch_async(
            "SELECT * FROM events WHERE id = 9",
            |_| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, RemoteError>(vec![1, 2])
            },
            |rows: &Vec<i32>| RowCounts::fetched(rows.len() as u64),
        )
        .await
        .unwrap();
    assert_eq!(rows, vec![1, 2]);

    let err = conn
        .dispatch_async(
            "SELECT * FROM events WHERE id = 10",
            |_| async { Err::<Vec<i32>, _>(RemoteError) },
            |rows: &Vec<i32>| RowCounts::fetched(rows.len() as u64),
        )
        .await;
    assert!(err.is_err());

    let m = counter.get("SELECT * FROM events WHERE id = ?").unwrap();
    assert_eq!(m.success_count, 1);
    assert_eq!(m.error_count, 1);
    assert_eq!(m.fetched_rows, 2);
    assert_eq!(counter.running_queries_count(), 0);
}

#[tokio::test]
async fn test_cancelled_async_dispatch_releases_gauge() {
    let conn = Instrumented::new(());
    let counter = Arc::new(QueryCounter::new());
    conn.register(counter.clone());

    let slow = conn.dispatch_async(
        "SELECT pg_sleep(10)",
        |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, RemoteError>(())
        },
        |_| RowCounts::default(),
    );
    let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;

    assert!(timed_out.is_err());
    assert_eq!(counter.running_queries_count(), 0);
    assert!(counter.metrics().is_empty());
}
