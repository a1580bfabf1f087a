//! Canonical query key to metrics record map.

use std::collections::BTreeMap;

use dashmap::DashMap;

use super::record::{MetricsRecord, QueryMetrics, RowCounts};

/// Get-or-create store of per-query records.
///
/// Records are never evicted; the number of keys is bounded by the
/// application's query vocabulary. Updates to one key are serialized by the
/// map's shard lock, so concurrent writers never lose increments.
#[derive(Debug, Default)]
pub struct MetricsStore {
    records: DashMap<String, MetricsRecord>,
}

impl MetricsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a success against `key`, creating its record if needed.
    pub fn record_success(&self, key: String, duration_ms: u64, rows: RowCounts) {
        self.records
            .entry(key)
            .or_default()
            .record_success(duration_ms, rows);
    }

    /// Record a failure against `key`, creating its record if needed.
    pub fn record_error(&self, key: String, duration_ms: u64) {
        self.records.entry(key).or_default().record_error(duration_ms);
    }

    /// Snapshot of the record for `key`.
    pub fn get(&self, key: &str) -> Option<QueryMetrics> {
        self.records.get(key).map(|record| QueryMetrics::from(&*record))
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.clear();
    }

    /// Copy of all records, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, QueryMetrics> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), QueryMetrics::from(entry.value())))
            .collect()
    }
}
