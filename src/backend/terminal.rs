//! Terminal backend: raw mode, Kitty graphics protocol, status bar.
//!
//! The whole page surface is sent as one raw RGBA image placed at the top
//! left cell. The last terminal row holds the status line.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, Event, KeyEventKind},
    style::{self, Stylize},
    terminal,
};
use log::{debug, warn};
use std::io::{self, Write, stdout};

use super::{Display, PageStatus, ViewportGeometry};
use crate::error::Result;
use crate::input::{InputSource, ViewerEvent, map_key_event};
use crate::surface::{ChannelOrder, PixelSurface};

const CHUNK_SIZE: usize = 4096;
const PAGE_IMAGE_ID: u32 = 1;

// ---------------------------------------------------------------------------
// RawGuard: restores raw mode / alternate screen / images on drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = write!(out, "\x1b_Ga=d,d=A,q=2\x1b\\");
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Terminal cell grid and the pixel area above the status row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub cols: u16,
    pub image_rows: u16,
    pub status_row: u16,
    pub cell_w: u16,
    pub cell_h: u16,
}

impl Layout {
    pub(super) fn viewport(&self) -> ViewportGeometry {
        ViewportGeometry::new(
            self.cols as u32 * self.cell_w as u32,
            self.image_rows as u32 * self.cell_h as u32,
        )
    }
}

pub(super) fn compute_layout(term_cols: u16, term_rows: u16, pixel_w: u16, pixel_h: u16) -> Layout {
    let image_rows = term_rows.saturating_sub(1);
    let status_row = term_rows.saturating_sub(1);
    let cell_w = if term_cols > 0 { pixel_w / term_cols } else { 1 };
    let cell_h = if term_rows > 0 { pixel_h / term_rows } else { 1 };
    Layout {
        cols: term_cols,
        image_rows,
        status_row,
        cell_w,
        cell_h,
    }
}

fn query_layout() -> io::Result<Layout> {
    let ws = terminal::window_size()?;
    Ok(compute_layout(ws.columns, ws.rows, ws.width, ws.height))
}

// ---------------------------------------------------------------------------
// Kitty protocol helpers
// ---------------------------------------------------------------------------

/// Transmit raw RGBA pixels in chunks and display them at the cursor (a=T).
fn send_rgba(data: &[u8], width: u32, height: u32, image_id: u32) -> io::Result<()> {
    let encoded = BASE64.encode(data);
    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(CHUNK_SIZE).collect();

    let mut out = stdout();
    out.queue(cursor::MoveTo(0, 0))?;
    for (i, chunk) in chunks.iter().enumerate() {
        let m = if i + 1 == chunks.len() { 0 } else { 1 };
        if i == 0 {
            write!(
                out,
                "\x1b_Ga=T,f=32,s={width},v={height},i={image_id},t=d,C=1,q=2,m={m};"
            )?;
        } else {
            write!(out, "\x1b_Gm={m},q=2;")?;
        }
        out.write_all(chunk)?;
        write!(out, "\x1b\\")?;
    }
    out.flush()
}

/// Delete image data and placements.
fn delete_image(image_id: u32) -> io::Result<()> {
    let mut out = stdout();
    write!(out, "\x1b_Ga=d,d=I,i={image_id},q=2\x1b\\")?;
    out.flush()
}

/// Delete all images and clear the text layer.
fn clear_screen() -> io::Result<()> {
    let mut out = stdout();
    write!(out, "\x1b_Ga=d,d=A,q=2\x1b\\")?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.flush()
}

pub(super) fn status_text(status: &PageStatus<'_>) -> String {
    format!(
        " {} | [Page {} of {}] ({} pages)  [a/s:page q:quit]",
        status.name, status.page, status.range_end, status.page_count
    )
}

/// Draw the status line on the last terminal row.
fn draw_status_bar(layout: &Layout, status: &PageStatus<'_>) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let padded = format!("{:<width$}", status_text(status), width = layout.cols as usize);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads keyboard from /dev/tty
    // (Unix) or Console API (Windows), so stdin being a pipe is always fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "the terminal backend requires an interactive terminal.\n\
             \n\
             Supported terminals: Kitty, Ghostty, WezTerm\n\
             Use --windowed to open a window instead"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TerminalBackend
// ---------------------------------------------------------------------------

pub struct TerminalBackend {
    layout: Layout,
    surface: PixelSurface,
    // Dropped last: restores the terminal after everything else is gone.
    _guard: RawGuard,
}

impl TerminalBackend {
    pub fn new() -> anyhow::Result<Self> {
        check_tty()?;
        let layout = query_layout()?;
        if layout.cell_w == 0 || layout.cell_h == 0 {
            anyhow::bail!(
                "terminal did not report its pixel size; a terminal with \
                 Kitty graphics support is required"
            );
        }
        debug!("terminal: layout {layout:?}");

        let guard = RawGuard::enter()?;
        let vp = layout.viewport();
        Ok(Self {
            layout,
            surface: PixelSurface::new(vp.width, vp.height, ChannelOrder::Rgba),
            _guard: guard,
        })
    }

    fn relayout(&mut self) -> Result<ViewerEvent> {
        let layout = query_layout()?;
        if layout.cell_w == 0 || layout.cell_h == 0 {
            warn!("terminal: resize without pixel size, keeping {:?}", self.layout);
            return Ok(ViewerEvent::Ignored);
        }
        debug!("terminal: resize {:?} -> {layout:?}", self.layout);
        self.layout = layout;
        let vp = layout.viewport();
        self.surface.resize(vp.width, vp.height);
        clear_screen()?;
        Ok(ViewerEvent::Resize(vp))
    }
}

impl Display for TerminalBackend {
    fn viewport(&self) -> ViewportGeometry {
        self.layout.viewport()
    }

    fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    fn show_status(&mut self, status: &PageStatus<'_>) -> Result<()> {
        draw_status_bar(&self.layout, status)?;
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        delete_image(PAGE_IMAGE_ID)?;
        send_rgba(
            self.surface.data(),
            self.surface.width(),
            self.surface.height(),
            PAGE_IMAGE_ID,
        )?;
        Ok(())
    }
}

impl InputSource for TerminalBackend {
    fn poll(&mut self) -> Result<ViewerEvent> {
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                Ok(map_key_event(key).map_or(ViewerEvent::Ignored, ViewerEvent::Command))
            }
            Event::Resize(..) => self.relayout(),
            _ => Ok(ViewerEvent::Ignored),
        }
    }
}
