//! querystat core - per-query performance statistics.
//!
//! This crate turns raw query observations into a deduplicated, continuously
//! updated statistics table keyed by canonical query text.

pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod observation;
pub mod observer;

pub use config::CounterConfig;
pub use error::{Error, Result};
pub use metrics::{
    new_shared_counter, LatencyCalibrator, MetricsRecord, MetricsStore, QueryCounter,
    QueryMetrics, RowCounts, SharedQueryCounter,
};
pub use normalize::{IdentityNormalizer, QueryNormalizer, SqlNormalizer};
pub use observation::{parse_observations, Observation, ReplayedError};
pub use observer::{QueryObserver, SharedObserver};
