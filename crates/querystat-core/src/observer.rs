//! Query lifecycle observer contract.
//!
//! Driver integrations report every dispatch through this trait instead of
//! patching driver internals. The contract for a single dispatch:
//!
//! 1. `on_query` exactly once when the dispatch starts.
//! 2. Exactly one of `on_result` / `on_error` when it completes, with the
//!    query text before normalization and the elapsed wall-clock time.
//!
//! Completing a dispatch twice double-counts it; the observer cannot detect
//! that. `on_abandoned` lets an integration release a started dispatch that
//! will never complete, and `on_latency_sample` feeds calibration probes.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::metrics::RowCounts;

/// Receiver of query lifecycle events.
pub trait QueryObserver: Send + Sync {
    /// A query dispatch started.
    fn on_query(&self);

    /// A query completed successfully.
    fn on_result(&self, query: &str, duration_ms: u64, rows: RowCounts);

    /// A query failed. The error is passed through for routing only.
    fn on_error(&self, query: &str, duration_ms: u64, error: &dyn StdError);

    /// A started dispatch ended without completing.
    fn on_abandoned(&self) {}

    /// A baseline round-trip measurement from a calibration probe.
    fn on_latency_sample(&self, _ms: u64) {}
}

impl<T: QueryObserver + ?Sized> QueryObserver for Arc<T> {
    fn on_query(&self) {
        (**self).on_query()
    }

    fn on_result(&self, query: &str, duration_ms: u64, rows: RowCounts) {
        (**self).on_result(query, duration_ms, rows)
    }

    fn on_error(&self, query: &str, duration_ms: u64, error: &dyn StdError) {
        (**self).on_error(query, duration_ms, error)
    }

    fn on_abandoned(&self) {
        (**self).on_abandoned()
    }

    fn on_latency_sample(&self, ms: u64) {
        (**self).on_latency_sample(ms)
    }
}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn QueryObserver>;
