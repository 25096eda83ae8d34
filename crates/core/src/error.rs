//! Error types for the pdftree layout engine.

use thiserror::Error;

/// Primary error type for layout analysis and tree building.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("invalid geometry on page {page}: {msg}")]
    InvalidGeometry { page: usize, msg: String },

    #[error("page {0} out of range")]
    PageOutOfRange(usize),

    #[error("document is scanned; refusing to build a layout tree")]
    ScannedDocument,

    #[error("{kind} predictor failed: {message}")]
    Predictor {
        kind: &'static str,
        message: String,
    },

    #[error("predictor returned {got} scores for {expected} candidates")]
    PredictionShape { expected: usize, got: usize },

    #[error("table extraction failed on page {page}: {message}")]
    TableExtraction { page: usize, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

impl LayoutError {
    /// Shorthand for a predictor failure carrying a displayable cause.
    pub fn predictor(kind: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Predictor {
            kind,
            message: cause.to_string(),
        }
    }
}
