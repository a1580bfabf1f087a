//! querystat driver adapters.
//!
//! Connections are wrapped rather than patched: an [`Instrumented`] wrapper
//! holds at most one registered [`QueryObserver`](querystat_core::QueryObserver)
//! and reports every dispatch made through it.

pub mod config;
pub mod error;
pub mod instrument;
pub mod sqlite;

pub use config::AdapterConfig;
pub use error::AdapterError;
pub use instrument::{DispatchGuard, Instrumented};
pub use sqlite::{SqliteAdapter, StatementOutput};
