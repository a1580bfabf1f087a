//! Per-query metrics records.

use serde::{Deserialize, Serialize};

/// Row counters reported with a successful query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    /// Rows returned to the caller.
    pub fetched: u64,
    /// Rows matched by a write.
    pub affected: u64,
    /// Rows actually modified by a write.
    pub changed: u64,
}

impl RowCounts {
    /// Counts for a read that returned `rows` rows.
    pub fn fetched(rows: u64) -> Self {
        Self {
            fetched: rows,
            ..Self::default()
        }
    }

    /// Counts for a write that matched `affected` rows and modified `changed`.
    pub fn written(affected: u64, changed: u64) -> Self {
        Self {
            fetched: 0,
            affected,
            changed,
        }
    }
}

/// Aggregate statistics for one canonical query.
///
/// Averages are derived from the totals on every read and are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsRecord {
    success_count: u64,
    error_count: u64,
    success_duration_total: u64,
    error_duration_total: u64,
    fetched_rows: u64,
    affected_rows: u64,
    changed_rows: u64,
}

impl MetricsRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful execution.
    pub fn record_success(&mut self, duration_ms: u64, rows: RowCounts) {
        self.success_count = self.success_count.saturating_add(1);
        self.success_duration_total = self.success_duration_total.saturating_add(duration_ms);
        self.fetched_rows = self.fetched_rows.saturating_add(rows.fetched);
        self.affected_rows = self.affected_rows.saturating_add(rows.affected);
        self.changed_rows = self.changed_rows.saturating_add(rows.changed);
    }

    /// Record a failed execution.
    pub fn record_error(&mut self, duration_ms: u64) {
        self.error_count = self.error_count.saturating_add(1);
        self.error_duration_total = self.error_duration_total.saturating_add(duration_ms);
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn success_duration_total(&self) -> u64 {
        self.success_duration_total
    }

    pub fn error_duration_total(&self) -> u64 {
        self.error_duration_total
    }

    /// Floor of the success total over the success count, 0 with no successes.
    pub fn success_duration_average(&self) -> u64 {
        self.success_duration_total
            .checked_div(self.success_count)
            .unwrap_or(0)
    }

    /// Floor of the error total over the error count, 0 with no errors.
    pub fn error_duration_average(&self) -> u64 {
        self.error_duration_total
            .checked_div(self.error_count)
            .unwrap_or(0)
    }

    pub fn fetched_rows(&self) -> u64 {
        self.fetched_rows
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn changed_rows(&self) -> u64 {
        self.changed_rows
    }
}

/// Serializable snapshot of a [`MetricsRecord`].
///
/// Field names are part of the output contract consumed by dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetrics {
    pub success_count: u64,
    pub error_count: u64,
    pub success_milliseconds_total: u64,
    pub error_milliseconds_total: u64,
    pub success_milliseconds_average: u64,
    pub error_milliseconds_average: u64,
    pub fetched_rows: u64,
    pub affected_rows: u64,
    pub changed_rows: u64,
}

impl From<&MetricsRecord> for QueryMetrics {
    fn from(record: &MetricsRecord) -> Self {
        Self {
            success_count: record.success_count(),
            error_count: record.error_count(),
            success_milliseconds_total: record.success_duration_total(),
            error_milliseconds_total: record.error_duration_total(),
            success_milliseconds_average: record.success_duration_average(),
            error_milliseconds_average: record.error_duration_average(),
            fetched_rows: record.fetched_rows(),
            affected_rows: record.affected_rows(),
            changed_rows: record.changed_rows(),
        }
    }
}
