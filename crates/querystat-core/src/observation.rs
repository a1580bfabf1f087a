//! Replayable lifecycle events.
//!
//! An observation log is newline-delimited JSON, one event per line:
//!
//! ```text
//! {"event":"latency","ms":50}
//! {"event":"query"}
//! {"event":"result","query":"SELECT 1 FROM t","duration_ms":100,"fetched_rows":3}
//! {"event":"error","query":"SELECT 1 FROM u","duration_ms":53,"message":"no such table"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::{QueryCounter, RowCounts};

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Observation {
    /// A dispatch started.
    Query,
    /// A dispatch succeeded.
    Result {
        query: String,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        fetched_rows: u64,
        #[serde(default)]
        affected_rows: u64,
        #[serde(default)]
        changed_rows: u64,
    },
    /// A dispatch failed.
    Error {
        query: String,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        message: Option<String>,
    },
    /// A latency baseline sample.
    Latency {
        ms: u64,
        #[serde(default)]
        reset: bool,
    },
    /// Metrics were reset.
    Clear,
}

/// Error value handed to `on_error` for replayed failures.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReplayedError(pub String);

impl Observation {
    /// Parse a single JSON event.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// Parse a newline-delimited observation log.
pub fn parse_observations(input: &str) -> Result<Vec<Observation>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            Observation::from_json(line).map_err(|e| Error::InvalidObservation {
                line: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

impl QueryCounter {
    /// Apply one replayed event.
    pub fn apply(&self, observation: &Observation) {
        match observation {
            Observation::Query => self.on_query(),
            Observation::Result {
                query,
                duration_ms,
                fetched_rows,
                affected_rows,
                changed_rows,
            } => self.on_result(
                query,
                *duration_ms,
                RowCounts {
                    fetched: *fetched_rows,
                    affected: *affected_rows,
                    changed: *changed_rows,
                },
            ),
            Observation::Error {
                query,
                duration_ms,
                message,
            } => {
                let error = ReplayedError(message.clone().unwrap_or_default());
                self.on_error(query, *duration_ms, &error);
            }
            Observation::Latency { ms, reset } => self.set_latency(*ms, *reset),
            Observation::Clear => self.clear(),
        }
    }

    /// Apply events in order.
    pub fn apply_all<'a>(&self, observations: impl IntoIterator<Item = &'a Observation>) {
        for observation in observations {
            self.apply(observation);
        }
    }
}
