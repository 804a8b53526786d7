use thiserror::Error;

use crate::layout::LayoutError;

/// Errors that abort a whole render.
///
/// Missing assets and absent optional data never show up here; they are
/// absorbed where they occur.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Render deadline exceeded")]
    DeadlineExceeded,

    #[error("Render cancelled")]
    Cancelled,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

/// Why an asset could not be resolved. Never escapes the asset layer.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Fetch timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        AssetError::Http(err.to_string())
    }
}
