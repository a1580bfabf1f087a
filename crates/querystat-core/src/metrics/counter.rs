//! Query counter engine.
//!
//! The counter owns the metrics store, the in-flight gauge and the latency
//! calibrator. Every hook runs to completion synchronously and is safe to
//! call from many threads at once.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use super::latency::LatencyCalibrator;
use super::record::{QueryMetrics, RowCounts};
use super::store::MetricsStore;
use crate::config::CounterConfig;
use crate::error::Result;
use crate::normalize::{QueryNormalizer, SqlNormalizer};
use crate::observer::QueryObserver;

/// Per-query statistics engine.
pub struct QueryCounter {
    config: CounterConfig,
    normalizer: Box<dyn QueryNormalizer>,
    store: MetricsStore,
    running: AtomicU64,
    latency: LatencyCalibrator,
}

impl QueryCounter {
    /// Create a counter with the default SQL normalizer.
    pub fn new() -> Self {
        Self::with_config(CounterConfig::default())
    }

    /// Create a counter from a configuration.
    pub fn with_config(config: CounterConfig) -> Self {
        let latency = match config.initial_latency_ms {
            Some(ms) => LatencyCalibrator::with_baseline(ms),
            None => LatencyCalibrator::new(),
        };
        Self {
            config,
            normalizer: Box::new(SqlNormalizer::new()),
            store: MetricsStore::new(),
            running: AtomicU64::new(0),
            latency,
        }
    }

    /// Replace the query normalizer.
    pub fn with_normalizer(mut self, normalizer: impl QueryNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Counter configuration.
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Report a latency baseline sample. See [`LatencyCalibrator::set_latency`].
    pub fn set_latency(&self, ms: u64, reset: bool) {
        self.latency.set_latency(ms, reset);
        tracing::debug!(
            sample_ms = ms,
            reset,
            calibrated_ms = ?self.latency.latency(),
            "latency calibrated"
        );
    }

    /// Current calibrated baseline.
    pub fn calibrated_latency(&self) -> Option<u64> {
        self.latency.latency()
    }

    /// A query dispatch started.
    pub fn on_query(&self) {
        let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(running, "query dispatched");
    }

    /// A query completed successfully.
    pub fn on_result(&self, query: &str, duration_ms: u64, rows: RowCounts) {
        let adjusted = self.latency.adjust(duration_ms);
        let key = self.normalizer.normalize(query);
        self.release();

        tracing::trace!(query = %key, duration_ms = adjusted, ?rows, "query succeeded");
        self.store.record_success(key, adjusted, rows);
    }

    /// A query failed. The error is not stored.
    pub fn on_error(&self, query: &str, duration_ms: u64, error: &dyn StdError) {
        let adjusted = self.latency.adjust(duration_ms);
        let key = self.normalizer.normalize(query);
        self.release();

        tracing::trace!(query = %key, duration_ms = adjusted, error = %error, "query failed");
        self.store.record_error(key, adjusted);
    }

    /// A dispatch ended without a result; only the in-flight gauge changes.
    pub fn on_abandoned(&self) {
        self.release();
        tracing::debug!("query dispatch abandoned");
    }

    /// Remove all records. The in-flight gauge and calibration are kept.
    pub fn clear(&self) {
        let dropped = self.store.len();
        self.store.clear();
        tracing::debug!(dropped, "query metrics cleared");
    }

    /// Number of dispatches started but not yet completed.
    pub fn running_queries_count(&self) -> u64 {
        self.running.load(Ordering::Acquire)
    }

    /// Read-only copy of all records keyed by canonical query.
    pub fn metrics(&self) -> BTreeMap<String, QueryMetrics> {
        self.store.snapshot()
    }

    /// Metrics for one canonical query key.
    pub fn get(&self, key: &str) -> Option<QueryMetrics> {
        self.store.get(key)
    }

    /// Number of distinct canonical queries recorded.
    pub fn query_count(&self) -> usize {
        self.store.len()
    }

    /// All records as a JSON object keyed by canonical query.
    pub fn metrics_as_object(&self) -> Value {
        let map = self
            .metrics()
            .into_iter()
            .map(|(key, metrics)| (key, metrics_to_value(&metrics)))
            .collect();
        Value::Object(map)
    }

    /// All records serialized as compact JSON.
    pub fn metrics_as_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metrics())?)
    }

    /// All records serialized as indented JSON.
    pub fn metrics_as_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.metrics())?)
    }

    /// Canonical key that `query` is recorded under.
    pub fn normalize(&self, query: &str) -> String {
        self.normalizer.normalize(query)
    }

    /// Decrement the in-flight gauge, never going below zero.
    fn release(&self) {
        let previous = self
            .running
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        if previous == 0 {
            // Normal when the observer was attached mid-flight.
            tracing::debug!("query completed with no dispatch in flight");
        }
    }
}

fn metrics_to_value(metrics: &QueryMetrics) -> Value {
    // Plain struct of integers, cannot fail to serialize.
    serde_json::to_value(metrics).unwrap_or(Value::Null)
}

impl Default for QueryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCounter")
            .field("config", &self.config)
            .field("queries", &self.store.len())
            .field("running", &self.running_queries_count())
            .field("calibrated_latency", &self.calibrated_latency())
            .finish()
    }
}

impl QueryObserver for QueryCounter {
    fn on_query(&self) {
        QueryCounter::on_query(self)
    }

    fn on_result(&self, query: &str, duration_ms: u64, rows: RowCounts) {
        QueryCounter::on_result(self, query, duration_ms, rows)
    }

    fn on_error(&self, query: &str, duration_ms: u64, error: &dyn StdError) {
        QueryCounter::on_error(self, query, duration_ms, error)
    }

    fn on_abandoned(&self) {
        QueryCounter::on_abandoned(self)
    }

    fn on_latency_sample(&self, ms: u64) {
        self.set_latency(ms, false)
    }
}

/// Shared counter handle.
pub type SharedQueryCounter = Arc<QueryCounter>;

/// Create a new shared counter with default configuration.
pub fn new_shared_counter() -> SharedQueryCounter {
    Arc::new(QueryCounter::new())
}
