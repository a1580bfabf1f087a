//! Query metrics aggregation.
//!
//! Raw observations (query text, duration, outcome, row counts) are folded
//! into one record per canonical query.
//!
//! # Usage
//!
//! ```
//! use querystat_core::metrics::{new_shared_counter, RowCounts};
//!
//! let counter = new_shared_counter();
//! counter.set_latency(50, false);
//!
//! counter.on_query();
//! counter.on_result("SELECT 1 FROM users", 100, RowCounts::fetched(3));
//!
//! let metrics = counter.get("SELECT ? FROM users").unwrap();
//! assert_eq!(metrics.success_milliseconds_total, 50);
//! assert_eq!(counter.running_queries_count(), 0);
//! ```

mod counter;
mod export;
mod latency;
mod record;
mod store;

pub use counter::{new_shared_counter, QueryCounter, SharedQueryCounter};
pub use latency::LatencyCalibrator;
pub use record::{MetricsRecord, QueryMetrics, RowCounts};
pub use store::MetricsStore;
