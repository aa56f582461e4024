//! Contract with the document rendering library.
//!
//! The viewer never looks inside a document: it opens it, counts pages,
//! asks for page bounds and gets pixels back. Handles release their
//! resources on drop.

use std::path::Path;

use crate::error::Result;
use crate::geom::{IRect, Matrix, Rect};
use crate::surface::PixelBuffer;

/// Opens documents.
pub trait Renderer {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>>;
}

/// An open paged document.
pub trait Document {
    fn page_count(&self) -> usize;

    /// Load a page by 0-based index. Fails with `PageLoad` when out of range.
    fn load_page(&self, index: usize) -> Result<Box<dyn Page + '_>>;
}

pub trait Page {
    /// Page box in points.
    fn bounds(&self) -> Rect;

    /// Rasterize with `ctm` (points to pixels) into a buffer covering exactly `bbox`.
    fn render(&self, ctm: &Matrix, bbox: IRect) -> Result<PixelBuffer>;
}
