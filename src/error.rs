//! Error types.
//!
//! Image and embed errors never leave the element they belong to; they are
//! turned into fallback text by the image loader. [`ExportError`] aborts the
//! export and is reported to the user by the orchestrator.

use thiserror::Error;

/// Why an image could not be turned into embeddable bytes.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The source could not even be interpreted, so no load was attempted.
    #[error("invalid image source: {0}")]
    InvalidSource(String),

    #[error("failed to fetch image: {0}")]
    Fetch(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

impl ImageError {
    /// `true` when the failure happened before any load started.
    pub fn is_pre_load(&self) -> bool {
        matches!(self, ImageError::InvalidSource(_))
    }
}

/// The PDF surface rejected a decoded image.
#[derive(Debug, Error)]
#[error("failed to embed image: {0}")]
pub struct EmbedError(pub String);

/// A failure that aborts the whole export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("host error: {0}")]
    Host(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
