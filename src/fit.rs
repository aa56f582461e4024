//! Fit a page into the viewport: zoom, rotation and fit-mode scaling.

use log::debug;
use serde::Deserialize;

use crate::geom::{IRect, Matrix, Rect};

/// Resolution at which one page point is one pixel.
pub const BASE_DPI: f32 = 72.0;

/// How page content is mapped into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Uniform scale, the whole page visible, centered.
    #[default]
    #[serde(alias = "aspect-fit")]
    Aspect,
    /// Each axis scaled independently to fill the viewport.
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub mode: FitMode,
    pub resolution: f32,
    pub rotation: f32,
    /// The user asked for `resolution`; it wins over fitting when the page already fits.
    pub explicit_resolution: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            mode: FitMode::Aspect,
            resolution: BASE_DPI,
            rotation: 0.0,
            explicit_resolution: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub zoom: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation_degrees: f32,
}

/// Result of fitting one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub transform: RenderTransform,
    /// Page points to device pixels.
    pub ctm: Matrix,
    /// Pixel box covered by the transformed page; never empty.
    pub bbox: IRect,
}

/// Compute the render transform for `page_bounds` in a `viewport_w`×`viewport_h` box.
///
/// A zero viewport dimension leaves that axis unconstrained.
pub fn compute(page_bounds: Rect, viewport_w: u32, viewport_h: u32, opts: &FitOptions) -> Fit {
    let zoom = opts.resolution / BASE_DPI;
    let base = Matrix::scale(zoom, zoom).concat(&Matrix::rotate(opts.rotation));
    let natural = base.transform_rect(&page_bounds);
    let natural_box = natural.round();

    let mut w = viewport_w;
    let mut h = viewport_h;
    if opts.explicit_resolution {
        if w != 0 && natural_box.width() <= w {
            w = 0;
        }
        if h != 0 && natural_box.height() <= h {
            h = 0;
        }
    }

    let (scale_x, scale_y) = if w == 0 && h == 0 {
        (1.0, 1.0)
    } else {
        let sx = axis_scale(w, natural.width());
        let sy = axis_scale(h, natural.height());
        match opts.mode {
            FitMode::Stretch => (
                if w == 0 { 1.0 } else { sx },
                if h == 0 { 1.0 } else { sy },
            ),
            FitMode::Aspect => {
                let sx = if w == 0 { sy } else { sx };
                let sy = if h == 0 { sx } else { sy };
                let s = sx.min(sy);
                (s, s)
            }
        }
    };

    let ctm = base.concat(&Matrix::scale(scale_x, scale_y));
    let bbox = ctm.transform_rect(&page_bounds).round();
    debug!(
        "fit: page {:.1}x{:.1}pt, viewport {viewport_w}x{viewport_h}, mode={:?} → scale {scale_x:.4}x{scale_y:.4}, bbox {}x{}",
        page_bounds.width(),
        page_bounds.height(),
        opts.mode,
        bbox.width(),
        bbox.height()
    );

    Fit {
        transform: RenderTransform {
            zoom,
            scale_x,
            scale_y,
            rotation_degrees: opts.rotation,
        },
        ctm,
        bbox,
    }
}

fn axis_scale(target: u32, extent: f32) -> f32 {
    if extent.abs() <= f32::EPSILON {
        1.0
    } else {
        target as f32 / extent
    }
}
