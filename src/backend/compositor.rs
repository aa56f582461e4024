//! Compositor backend: an undecorated window with client-side chrome.
//!
//! The window manager draws nothing; we paint a flat title bar and border
//! around the page area and negotiate the window size ourselves.

use super::Insets;
use super::window::{WindowBackend, WindowStyle};
use crate::config::WindowConfig;
use crate::surface::{PixelSurface, SurfaceBox};

const CHROME_COLOR: [u8; 3] = [0x3b, 0x3b, 0x3b];
const TITLE_COLOR: [u8; 3] = [0x2a, 0x2a, 0x2a];

/// Client-side decoration sizes, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub title_bar: u32,
    pub border: u32,
}

impl Chrome {
    pub fn from_config(config: &WindowConfig) -> Self {
        Self {
            title_bar: config.title_bar,
            border: config.border,
        }
    }

    /// The title bar sits inside the top border.
    pub fn insets(&self) -> Insets {
        Insets {
            left: self.border,
            top: self.border + self.title_bar,
            right: self.border,
            bottom: self.border,
        }
    }

    /// Whether a point (window pixels) is on the title bar.
    pub fn in_title_bar(&self, y: f64) -> bool {
        (0.0..f64::from(self.border + self.title_bar)).contains(&y)
    }

    /// Paint the chrome around the content box of a `surface`-sized window.
    pub fn paint(&self, surface: &mut PixelSurface) {
        let (w, h) = (surface.width(), surface.height());
        let insets = self.insets();
        surface.fill_rect(SurfaceBox::new(0, 0, w, insets.top), CHROME_COLOR);
        surface.fill_rect(
            SurfaceBox::new(self.border, self.border, w.saturating_sub(2 * self.border), self.title_bar),
            TITLE_COLOR,
        );
        surface.fill_rect(SurfaceBox::new(0, 0, insets.left, h), CHROME_COLOR);
        surface.fill_rect(
            SurfaceBox::new(w.saturating_sub(insets.right), 0, insets.right, h),
            CHROME_COLOR,
        );
        surface.fill_rect(
            SurfaceBox::new(0, h.saturating_sub(insets.bottom), w, insets.bottom),
            CHROME_COLOR,
        );
    }
}

/// Answer to a size the compositor proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeNegotiation {
    Accept,
    /// Too small; ask for this size instead.
    Offer { width: u32, height: u32 },
}

/// Accept `requested` when it meets `min` on both axes, otherwise offer the
/// request clamped up to `min`.
pub fn negotiate(requested: (u32, u32), min: (u32, u32)) -> SizeNegotiation {
    let (w, h) = requested;
    if w >= min.0 && h >= min.1 {
        SizeNegotiation::Accept
    } else {
        SizeNegotiation::Offer {
            width: w.max(min.0),
            height: h.max(min.1),
        }
    }
}

/// Open a compositor-style window. The configured size is the page area;
/// chrome is added around it.
pub fn open(config: &WindowConfig) -> anyhow::Result<WindowBackend> {
    WindowBackend::new(WindowStyle::Compositor(Chrome::from_config(config)), config)
}
