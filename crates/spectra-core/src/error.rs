//! Error types for spectra-core.

use thiserror::Error;

/// Error type for graph loading and preprocessing.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error while reading the attribute table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Edge list or attribute table is inconsistent or unparsable.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A named option (such as a feature set) is not recognised.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Matrix dimensions do not line up.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
