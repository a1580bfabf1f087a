//! Adapter error types.

use thiserror::Error;

/// Errors raised while attaching instrumentation.
///
/// Errors from instrumented calls are never wrapped; they reach the caller
/// exactly as the driver produced them.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The connection handed to `attach` is not one this adapter drives.
    #[error("unsupported connection type: expected {expected}")]
    UnsupportedConnection {
        /// Type the adapter accepts.
        expected: &'static str,
    },

    /// Driver error while opening or calibrating.
    #[error("driver error: {0}")]
    Driver(#[from] rusqlite::Error),
}
