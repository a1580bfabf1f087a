//! SQLite adapter built on rusqlite.
//!
//! SQLite reports a single change count per write, so it is used for both
//! affected and changed rows.

use std::any::Any;
use std::path::Path;
use std::time::Instant;

use querystat_core::{RowCounts, SharedObserver};
use rusqlite::{Connection, Params, Row};

use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::instrument::Instrumented;

/// Instrumented SQLite connection.
#[derive(Debug)]
pub struct SqliteAdapter {
    conn: Instrumented<Connection>,
    config: AdapterConfig,
}

impl SqliteAdapter {
    /// Take ownership of a type-erased connection.
    ///
    /// Fails fast if `conn` is not a `rusqlite::Connection`.
    pub fn attach(conn: Box<dyn Any + Send>) -> Result<Self, AdapterError> {
        match conn.downcast::<Connection>() {
            Ok(conn) => Ok(Self::from_connection(*conn)),
            Err(_) => Err(AdapterError::UnsupportedConnection {
                expected: std::any::type_name::<Connection>(),
            }),
        }
    }

    /// Wrap an open connection with default configuration.
    pub fn from_connection(conn: Connection) -> Self {
        Self::with_config(conn, AdapterConfig::default())
    }

    /// Wrap an open connection.
    pub fn with_config(conn: Connection, config: AdapterConfig) -> Self {
        Self {
            conn: Instrumented::new(conn),
            config,
        }
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, AdapterError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Open a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening sqlite database");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Replace the adapter configuration. Takes effect on the next
    /// registration or calibration.
    pub fn with_adapter_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Adapter configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Attach an observer; later calls are no-ops returning `false`.
    ///
    /// With `calibrate_on_register` set, a newly attached observer receives
    /// a calibration run immediately.
    pub fn register(&self, observer: SharedObserver) -> Result<bool, AdapterError> {
        if !self.conn.register(observer) {
            return Ok(false);
        }
        if self.config.calibrate_on_register {
            self.calibrate(self.config.calibration_samples)?;
        }
        Ok(true)
    }

    /// Whether an observer is attached.
    pub fn is_instrumented(&self) -> bool {
        self.conn.is_instrumented()
    }

    /// Measure round-trip overhead with the probe query.
    ///
    /// Each sample is reported to the observer as a latency baseline. Probe
    /// queries are not recorded as query metrics. Returns the smallest
    /// sample, or `None` when `samples` is 0.
    pub fn calibrate(&self, samples: u32) -> Result<Option<u64>, AdapterError> {
        let conn = self.conn.inner();
        let mut best: Option<u64> = None;

        for _ in 0..samples {
            let started = Instant::now();
            conn.query_row(&self.config.probe_query, [], |_| Ok(()))?;
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some(observer) = self.conn.observer() {
                observer.on_latency_sample(elapsed);
            }
            best = Some(best.map_or(elapsed, |b| b.min(elapsed)));
        }

        tracing::debug!(samples, baseline_ms = ?best, "sqlite latency calibrated");
        Ok(best)
    }

    /// Execute a single statement, returning the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        self.conn.dispatch(
            sql,
            |conn| conn.execute(sql, params),
            |changes: &usize| RowCounts::written(*changes as u64, *changes as u64),
        )
    }

    /// Execute several statements separated by semicolons.
    ///
    /// Reported as one dispatch keyed by the whole batch text.
    pub fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn
            .dispatch(sql, |conn| conn.execute_batch(sql), |_| RowCounts::default())
    }

    /// Run a query and map every returned row.
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn.dispatch(
            sql,
            |conn| {
                let mut stmt = conn.prepare(sql)?;
                let mapped = stmt.query_map(params, f)?;
                mapped.collect::<rusqlite::Result<Vec<T>>>()
            },
            |rows: &Vec<T>| RowCounts::fetched(rows.len() as u64),
        )
    }

    /// Run a query expected to return exactly one row.
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn.dispatch(
            sql,
            |conn| conn.query_row(sql, params, f),
            |_| RowCounts::fetched(1),
        )
    }

    /// Run one statement of unknown kind.
    ///
    /// Statements that produce columns are read to completion and their rows
    /// returned as display strings; anything else is executed as a write.
    pub fn run(&self, sql: &str) -> rusqlite::Result<StatementOutput> {
        self.conn.dispatch(
            sql,
            |conn| {
                let mut stmt = conn.prepare(sql)?;
                let columns: Vec<String> =
                    stmt.column_names().into_iter().map(String::from).collect();
                if columns.is_empty() {
                    let changes = stmt.execute([])?;
                    return Ok(StatementOutput {
                        columns,
                        rows: Vec::new(),
                        changes,
                    });
                }

                let mut rows = stmt.query([])?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() {
                        values.push(value_to_string(row.get_ref(i)?));
                    }
                    out.push(values);
                }
                Ok(StatementOutput {
                    columns,
                    rows: out,
                    changes: 0,
                })
            },
            StatementOutput::row_counts,
        )
    }

    /// The underlying connection. Calls made through it are not reported.
    pub fn connection(&self) -> &Connection {
        self.conn.inner()
    }

    /// Unwrap the connection.
    pub fn into_inner(self) -> Connection {
        self.conn.into_inner()
    }
}

/// Result of [`SqliteAdapter::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOutput {
    /// Column names; empty for writes.
    pub columns: Vec<String>,
    /// Returned rows rendered as strings.
    pub rows: Vec<Vec<String>>,
    /// Rows changed by a write.
    pub changes: usize,
}

impl StatementOutput {
    fn row_counts(&self) -> RowCounts {
        if self.columns.is_empty() {
            RowCounts::written(self.changes as u64, self.changes as u64)
        } else {
            RowCounts::fetched(self.rows.len() as u64)
        }
    }
}

fn value_to_string(value: rusqlite::types::ValueRef<'_>) -> String {
    use rusqlite::types::ValueRef;

    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
