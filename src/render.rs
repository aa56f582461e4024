//! Typst as the document renderer: compile a `.typ` file once, rasterize pages on demand.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};
use typst::layout::{Page as TypstPage, PagedDocument};

use crate::document::{Document, Page, Renderer};
use crate::error::{Result, ViewerError};
use crate::geom::{IRect, Matrix, Rect};
use crate::surface::{ChannelOrder, PixelBuffer};
use crate::world::{DocumentWorld, FontCache};

/// Opens Typst sources. Fonts are searched once and reused for every document.
pub struct TypstRenderer {
    fonts: Arc<FontCache>,
}

impl TypstRenderer {
    pub fn new() -> Self {
        Self {
            fonts: Arc::new(FontCache::new()),
        }
    }
}

impl Default for TypstRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TypstRenderer {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>> {
        let start = Instant::now();
        let open_err = |detail: String| ViewerError::DocumentOpen {
            path: path.to_path_buf(),
            detail,
        };

        let world = DocumentWorld::new(path, Arc::clone(&self.fonts))
            .map_err(|e| open_err(e.to_string()))?;
        let document = compile_document(&world).map_err(open_err)?;

        info!(
            "opened {} ({} pages) in {:.1}ms",
            path.display(),
            document.pages.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Box::new(TypstDocument { document }))
    }
}

/// Compile the world's main file, logging warnings.
pub fn compile_document(world: &DocumentWorld) -> std::result::Result<PagedDocument, String> {
    let warned = typst::compile::<PagedDocument>(world);
    for warning in &warned.warnings {
        warn!("typst warning: {}", warning.message);
    }
    warned.output.map_err(|errors| {
        let mut msg = format!("typst compilation failed with {} error(s)", errors.len());
        for err in &errors {
            msg.push_str("\n  ");
            msg.push_str(&err.message);
        }
        msg
    })
}

struct TypstDocument {
    document: PagedDocument,
}

impl Document for TypstDocument {
    fn page_count(&self) -> usize {
        self.document.pages.len()
    }

    fn load_page(&self, index: usize) -> Result<Box<dyn Page + '_>> {
        let page = self
            .document
            .pages
            .get(index)
            .ok_or_else(|| ViewerError::PageLoad {
                page: index + 1,
                detail: format!("document has {} pages", self.document.pages.len()),
            })?;
        Ok(Box::new(TypstPageRef {
            page,
            number: index + 1,
        }))
    }
}

struct TypstPageRef<'a> {
    page: &'a TypstPage,
    number: usize,
}

impl Page for TypstPageRef<'_> {
    fn bounds(&self) -> Rect {
        let size = self.page.frame.size();
        Rect::from_size(size.x.to_pt() as f32, size.y.to_pt() as f32)
    }

    fn render(&self, ctm: &Matrix, bbox: IRect) -> Result<PixelBuffer> {
        let (width, height) = (bbox.width(), bbox.height());
        let mut target = Pixmap::new(width, height).ok_or_else(|| ViewerError::Render {
            page: self.number,
            detail: format!("cannot allocate a {width}x{height} pixmap"),
        })?;
        target.fill(Color::WHITE);

        // Rasterize at the largest scale the transform reaches, then map the
        // raster through the rest of the transform (rotation, axis stretch).
        let pixel_per_pt = ctm.max_expansion().max(f32::EPSILON);
        let raster = typst_render::render(self.page, pixel_per_pt);
        let to_device = Transform::from_scale(1.0 / pixel_per_pt, 1.0 / pixel_per_pt).post_concat(
            Transform::from_row(
                ctm.a,
                ctm.b,
                ctm.c,
                ctm.d,
                ctm.e - bbox.x0 as f32,
                ctm.f - bbox.y0 as f32,
            ),
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, raster.as_ref(), &paint, to_device, None);

        PixelBuffer::new(width, height, ChannelOrder::Rgba, target.take()).ok_or_else(|| {
            ViewerError::Render {
                page: self.number,
                detail: "[BUG] pixmap size does not match bbox".into(),
            }
        })
    }
}
