//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metrics engine error.
    #[error(transparent)]
    Core(#[from] querystat_core::Error),

    /// Adapter setup error.
    #[error(transparent)]
    Adapter(#[from] querystat_driver::AdapterError),

    /// No statements were given to run.
    #[error("no statements to run; pass --command or --script")]
    NoStatements,
}
