//! Core error types.

use thiserror::Error;

/// Core errors.
///
/// The recording hooks never fail; these only come from export and replay.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A replay line could not be parsed.
    #[error("invalid observation at line {line}: {reason}")]
    InvalidObservation {
        /// 1-based line number.
        line: usize,
        /// Parser message.
        reason: String,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
