//! Error types for spectra-nn.

use thiserror::Error;

/// Model building, training and prediction errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Graph or feature preprocessing error.
    #[error(transparent)]
    Graph(#[from] spectra_core::Error),

    /// Dimension mismatch between features, operator and layers.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Query or seed node outside `0..N`.
    #[error("node {node} out of range for a graph with {nodes} nodes")]
    NodeOutOfRange { node: usize, nodes: usize },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
