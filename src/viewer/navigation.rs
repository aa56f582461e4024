//! Page navigation state machine for one open document.
//!
//! States: `Idle` (no active range) -> `RangeActive` (cursor on a page of the
//! current interval) -> back to `Idle` when the document is closed, or
//! `Closed` on quit. `Closed` is terminal.
//!
//! The cursor is loose: `Prev` may move below the interval
//! start (never below page 1) and `Next` stops at the interval end. Once the
//! last page of an interval is reached, only quitting leaves it.

use std::path::Path;

use log::{debug, info, warn};

use crate::backend::{Backend, Display, PageStatus, ViewportGeometry};
use crate::document::{Document, Renderer};
use crate::error::{Result, ViewerError};
use crate::fit::{self, FitOptions};
use crate::input::{Command, ViewerEvent};
use crate::range::{self, PageRangeSpec};
use crate::surface::blit;

const DEFAULT_BACKGROUND: [u8; 3] = [0x77, 0x77, 0x77];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Snapshot of where the viewer is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// Display name of the open document; empty once it was closed.
    pub current_document: String,
    /// 1-based page the cursor is on.
    pub current_page: usize,
    /// Last page of the active interval.
    pub range_end_page: usize,
    /// A document is open and a range is active.
    pub is_live: bool,
}

/// How a range session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeExit {
    /// Nothing left to show (the range selected no pages).
    Finished,
    /// The user asked to stop viewing altogether.
    Quit,
}

enum Phase {
    Idle,
    RangeActive {
        ranges: PageRangeSpec,
        interval: usize,
        cursor: usize,
    },
    Closed,
}

struct OpenDocument {
    name: String,
    document: Box<dyn Document>,
}

pub struct NavigationController {
    fit: FitOptions,
    background: [u8; 3],
    strict_ranges: bool,
    document: Option<OpenDocument>,
    phase: Phase,
    viewport: Option<ViewportGeometry>,
    errored: bool,
}

impl NavigationController {
    pub fn new(fit: FitOptions) -> Self {
        Self {
            fit,
            background: DEFAULT_BACKGROUND,
            strict_ranges: false,
            document: None,
            phase: Phase::Idle,
            viewport: None,
            errored: false,
        }
    }

    /// Color around the page.
    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    /// Reject malformed range tokens instead of reading them leniently.
    pub fn with_strict_ranges(mut self, strict: bool) -> Self {
        self.strict_ranges = strict;
        self
    }

    /// Open `path`, releasing any previously open document first.
    ///
    /// On failure the controller stays `Idle` with no document.
    pub fn open(&mut self, renderer: &dyn Renderer, path: &Path) -> Result<()> {
        if let Phase::Closed = self.phase {
            return Err(ViewerError::backend("viewer was closed"));
        }
        self.close_document();
        let document = renderer.open(path)?;
        info!(
            "viewer: opened {} ({} pages)",
            path.display(),
            document.page_count()
        );
        self.document = Some(OpenDocument {
            name: path.display().to_string(),
            document,
        });
        Ok(())
    }

    /// Release the open document, if any.
    pub fn close_document(&mut self) {
        if let Some(open) = self.document.take() {
            debug!("viewer: closed {}", open.name);
        }
        if let Phase::RangeActive { .. } = self.phase {
            self.phase = Phase::Idle;
        }
    }

    /// Start showing `spec` in the open document.
    ///
    /// Returns `false` (staying `Idle`) when no document is open or the
    /// range selects no pages.
    pub fn begin_range(&mut self, spec: &str) -> Result<bool> {
        if let Phase::Closed = self.phase {
            return Ok(false);
        }
        let Some(open) = &self.document else {
            warn!("viewer: range '{spec}' without an open document");
            return Ok(false);
        };
        let count = open.document.page_count();
        let ranges = if self.strict_ranges {
            range::parse_strict(spec, count)?
        } else {
            range::parse(spec, count)
        };
        let Some(first) = ranges.get(0) else {
            debug!("viewer: range '{spec}' selects no pages of {count}");
            return Ok(false);
        };
        debug!("viewer: range '{spec}' -> {:?}", ranges.intervals());
        self.phase = Phase::RangeActive {
            cursor: first.start,
            interval: 0,
            ranges,
        };
        Ok(true)
    }

    /// Move the cursor. Returns the new page, or `None` without an active range.
    pub fn advance(&mut self, direction: Direction) -> Option<usize> {
        let Phase::RangeActive {
            ranges,
            interval,
            cursor,
        } = &mut self.phase
        else {
            return None;
        };
        let current = ranges.get(*interval)?;
        *cursor = match direction {
            Direction::Prev => cursor.saturating_sub(1).max(1),
            Direction::Next => (*cursor + 1).min(current.end),
        };
        if current.contains(*cursor) {
            debug!("viewer: {direction:?} -> page {cursor}");
        } else {
            debug!("viewer: {direction:?} -> page {cursor}, before interval {current:?}");
        }
        Some(*cursor)
    }

    /// Stop viewing. Releases the document; nothing can be opened afterwards.
    pub fn quit(&mut self) {
        self.document = None;
        self.phase = Phase::Closed;
        info!("viewer: quit");
    }

    /// Record a new viewport and redraw the current page in it.
    pub fn on_resize<D: Display + ?Sized>(
        &mut self,
        display: &mut D,
        viewport: ViewportGeometry,
    ) -> Result<()> {
        debug!("viewer: viewport {:?} -> {viewport:?}", self.viewport);
        self.viewport = Some(viewport);
        if self.is_live() {
            self.render_current(display)?;
        }
        Ok(())
    }

    pub fn state(&self) -> Option<NavigationState> {
        match &self.phase {
            Phase::RangeActive {
                ranges,
                interval,
                cursor,
            } => Some(NavigationState {
                current_document: self
                    .document
                    .as_ref()
                    .map(|open| open.name.clone())
                    .unwrap_or_default(),
                current_page: *cursor,
                range_end_page: ranges.get(*interval).map_or(*cursor, |iv| iv.end),
                is_live: self.document.is_some(),
            }),
            Phase::Idle | Phase::Closed => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::RangeActive { .. }) && self.document.is_some()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, Phase::Closed)
    }

    /// Whether a page failed to render or did not fit since creation.
    pub fn errored(&self) -> bool {
        self.errored
    }

    /// Draw the page under the cursor: fit it to the viewport, compose it
    /// onto the background, update the status and present.
    ///
    /// Render and placement failures are recorded (see [`errored`]) and the
    /// background is still shown. Page load failures are returned.
    ///
    /// [`errored`]: Self::errored
    pub fn render_current<D: Display + ?Sized>(&mut self, display: &mut D) -> Result<()> {
        let Phase::RangeActive {
            ranges,
            interval,
            cursor,
        } = &self.phase
        else {
            return Ok(());
        };
        let Some(open) = &self.document else {
            return Ok(());
        };
        let page_no = *cursor;
        let range_end = ranges.get(*interval).map_or(page_no, |iv| iv.end);
        let viewport = self.viewport.unwrap_or_else(|| display.viewport());

        let page = open.document.load_page(page_no - 1)?;
        let fit = fit::compute(page.bounds(), viewport.width, viewport.height, &self.fit);
        let rendered = page.render(&fit.ctm, fit.bbox);

        let surface = display.surface_mut();
        surface.fill(self.background);
        let composed = rendered.and_then(|mut buf| blit(&mut buf, surface, viewport.content_box()));
        if let Err(e) = composed {
            if !e.is_recoverable() {
                return Err(e);
            }
            warn!("viewer: page {page_no} of {}: {e}", open.name);
            self.errored = true;
        }

        display.show_status(&PageStatus {
            name: &open.name,
            page: page_no,
            range_end,
            page_count: open.document.page_count(),
        })?;
        display.present()
    }

    /// Show `spec` of the open document until the user quits.
    ///
    /// Renders once, then handles exactly one event per step.
    pub fn run<B: Backend + ?Sized>(&mut self, backend: &mut B, spec: &str) -> Result<RangeExit> {
        if !self.begin_range(spec)? {
            return Ok(RangeExit::Finished);
        }
        self.viewport = Some(backend.viewport());
        self.render_current(backend)?;
        loop {
            match backend.poll()? {
                ViewerEvent::Command(Command::Prev) => {
                    self.advance(Direction::Prev);
                    self.render_current(backend)?;
                }
                ViewerEvent::Command(Command::Next) => {
                    self.advance(Direction::Next);
                    self.render_current(backend)?;
                }
                ViewerEvent::Command(Command::Quit) | ViewerEvent::Close => {
                    self.quit();
                    return Ok(RangeExit::Quit);
                }
                ViewerEvent::Resize(viewport) => self.on_resize(backend, viewport)?,
                ViewerEvent::Ignored => {}
            }
        }
    }
}
