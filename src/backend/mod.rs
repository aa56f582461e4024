//! Display backends.
//!
//! A backend owns a pixel surface sized to its drawable area, shows it on
//! request and turns native input into [`ViewerEvent`]s. Three are provided:
//!
//! - `terminal`: Kitty graphics protocol inside the controlling terminal
//! - `window`: a plain decorated desktop window
//! - `compositor`: an undecorated window drawing its own title bar and border
//!
//! [`ViewerEvent`]: crate::input::ViewerEvent

#[cfg(feature = "window")]
pub mod compositor;
pub mod terminal;
#[cfg(feature = "window")]
pub mod window;

use serde::Deserialize;

use crate::config::Config;
use crate::error::Result;
use crate::input::InputSource;
use crate::surface::{PixelSurface, SurfaceBox};

/// Application name used in window titles.
pub const APP_NAME: &str = "fitview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Terminal,
    Window,
    Compositor,
}

/// Space taken by client-side decorations on each edge, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Insets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Insets {
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

/// The drawable area pages are fitted into.
///
/// `width`/`height` exclude decorations; the surface itself is larger by
/// `insets` on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
    pub width: u32,
    pub height: u32,
    pub insets: Insets,
}

impl ViewportGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            insets: Insets::default(),
        }
    }

    /// Geometry of a surface of `surface_w`x`surface_h` with `insets` reserved.
    pub fn within(surface_w: u32, surface_h: u32, insets: Insets) -> Self {
        Self {
            width: surface_w.saturating_sub(insets.horizontal()),
            height: surface_h.saturating_sub(insets.vertical()),
            insets,
        }
    }

    /// Where pages go on the surface.
    pub fn content_box(&self) -> SurfaceBox {
        SurfaceBox::new(self.insets.left, self.insets.top, self.width, self.height)
    }
}

/// What the status line or window title reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStatus<'a> {
    pub name: &'a str,
    /// 1-based page on screen.
    pub page: usize,
    /// Last page of the active range interval.
    pub range_end: usize,
    pub page_count: usize,
}

/// Output half of a backend.
pub trait Display {
    fn viewport(&self) -> ViewportGeometry;

    /// The surface pages are composed into. Shown by the next `present`.
    fn surface_mut(&mut self) -> &mut PixelSurface;

    fn show_status(&mut self, status: &PageStatus<'_>) -> Result<()>;

    fn present(&mut self) -> Result<()>;
}

/// A complete backend: something to draw on and something to read input from.
pub trait Backend: Display + InputSource {}

impl<T: Display + InputSource + ?Sized> Backend for T {}

/// Open the backend of the given kind.
#[cfg_attr(not(feature = "window"), allow(unused_variables))]
pub fn open(kind: BackendKind, config: &Config) -> anyhow::Result<Box<dyn Backend>> {
    match kind {
        BackendKind::Terminal => Ok(Box::new(terminal::TerminalBackend::new()?)),
        #[cfg(feature = "window")]
        BackendKind::Window => Ok(Box::new(window::WindowBackend::new(
            window::WindowStyle::Simple,
            &config.window,
        )?)),
        #[cfg(feature = "window")]
        BackendKind::Compositor => Ok(Box::new(compositor::open(&config.window)?)),
        #[cfg(not(feature = "window"))]
        BackendKind::Window | BackendKind::Compositor => {
            anyhow::bail!("fitview was built without window support (enable the `window` feature)")
        }
    }
}
