//! Error types for the redaction pipeline.
//!
//! Page- and document-level failures are *recorded* in their result rows
//! rather than raised; the variants here cover the remaining cases where an
//! operation has no result row to record into (configuration, I/O, output
//! writing, persistence).

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlackbarError>;

/// Top-level error type for the blackbar crate.
#[derive(Debug, thiserror::Error)]
pub enum BlackbarError {
    /// Filesystem failure (reading input, writing output).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF reader could not be initialised or a document could not be
    /// opened at all. Per-page reader failures are recorded in `PageResult`.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Image encoding or decoding failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid configuration value. Always fatal.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON or CSV serialisation failure while writing outputs.
    #[error("serialisation error: {0}")]
    Serialize(String),

    /// Failure in the persistence contract (store open/apply).
    #[error("persistence error: {0}")]
    Persist(String),

    /// The run was interrupted by the operator before completion.
    #[error("interrupted")]
    Interrupted,
}

impl BlackbarError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for BlackbarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<csv::Error> for BlackbarError {
    fn from(err: csv::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
