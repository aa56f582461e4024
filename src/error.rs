//! Error taxonomy shared by the core and the backends.

use std::path::PathBuf;

/// Errors produced while opening, navigating and displaying documents.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("cannot open document '{}': {detail}", path.display())]
    DocumentOpen { path: PathBuf, detail: String },

    #[error("cannot load page {page}: {detail}")]
    PageLoad { page: usize, detail: String },

    #[error("cannot render page {page}: {detail}")]
    Render { page: usize, detail: String },

    #[error(
        "page {rendered_w}x{rendered_h} at ({x}, {y}) does not fit surface {surface_w}x{surface_h}"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        rendered_w: u32,
        rendered_h: u32,
        surface_w: u32,
        surface_h: u32,
    },

    #[error("invalid page range token '{0}'")]
    InvalidRangeToken(String),

    #[error("display backend: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Render and compositing failures are flagged but do not abort the document.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Render { .. } | Self::OutOfBounds { .. })
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
