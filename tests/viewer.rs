//! Whole-run behavior with a scripted backend and an in-memory renderer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use fitview::backend::{Display, PageStatus, ViewportGeometry};
use fitview::config::{CliOverrides, Config, ConfigFile};
use fitview::document::{Document, Page, Renderer};
use fitview::error::{Result, ViewerError};
use fitview::geom::{IRect, Matrix, Rect};
use fitview::input::{Command, InputSource, ViewerEvent};
use fitview::surface::{ChannelOrder, PixelBuffer, PixelSurface};
use fitview::viewer::{self, DocumentJob};

// ---------------------------------------------------------------------------
// In-memory documents
// ---------------------------------------------------------------------------

/// Documents by file name: `empty` has no pages, `broken` pages fail to
/// render, `missing` does not open, anything else has `pages` pages.
struct MemoryRenderer {
    pages: usize,
    opened: Rc<RefCell<Vec<String>>>,
}

impl Renderer for MemoryRenderer {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>> {
        let name = path.display().to_string();
        self.opened.borrow_mut().push(name.clone());
        let (pages, broken) = match name.as_str() {
            "missing" => {
                return Err(ViewerError::DocumentOpen {
                    path: path.to_path_buf(),
                    detail: "no such file".into(),
                });
            }
            "empty" => (0, false),
            "broken" => (self.pages, true),
            _ => (self.pages, false),
        };
        Ok(Box::new(MemoryDocument { pages, broken }))
    }
}

struct MemoryDocument {
    pages: usize,
    broken: bool,
}

impl Document for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn load_page(&self, index: usize) -> Result<Box<dyn Page + '_>> {
        if index >= self.pages {
            return Err(ViewerError::PageLoad {
                page: index + 1,
                detail: "out of range".into(),
            });
        }
        Ok(Box::new(MemoryPage {
            number: index + 1,
            broken: self.broken,
        }))
    }
}

struct MemoryPage {
    number: usize,
    broken: bool,
}

impl Page for MemoryPage {
    fn bounds(&self) -> Rect {
        Rect::from_size(100.0, 50.0)
    }

    fn render(&self, _ctm: &Matrix, bbox: IRect) -> Result<PixelBuffer> {
        if self.broken {
            return Err(ViewerError::Render {
                page: self.number,
                detail: "corrupt content stream".into(),
            });
        }
        let (w, h) = (bbox.width(), bbox.height());
        let data = [0u8, 0, 0, 255].repeat((w * h) as usize);
        PixelBuffer::new(w, h, ChannelOrder::Rgba, data).ok_or_else(|| ViewerError::Render {
            page: self.number,
            detail: "size".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

struct ScriptedBackend {
    viewport: ViewportGeometry,
    surface: PixelSurface,
    script: VecDeque<ViewerEvent>,
    /// (document, page, range end) per status update.
    shown: Vec<(String, usize, usize)>,
    presents: usize,
}

impl ScriptedBackend {
    fn new(events: &[ViewerEvent]) -> Self {
        Self {
            viewport: ViewportGeometry::new(200, 200),
            surface: PixelSurface::new(200, 200, ChannelOrder::Bgra),
            script: events.iter().copied().collect(),
            shown: Vec::new(),
            presents: 0,
        }
    }

    fn pages(&self) -> Vec<usize> {
        self.shown.iter().map(|(_, page, _)| *page).collect()
    }
}

impl Display for ScriptedBackend {
    fn viewport(&self) -> ViewportGeometry {
        self.viewport
    }

    fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    fn show_status(&mut self, status: &PageStatus<'_>) -> Result<()> {
        self.shown
            .push((status.name.to_string(), status.page, status.range_end));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.presents += 1;
        Ok(())
    }
}

impl InputSource for ScriptedBackend {
    fn poll(&mut self) -> Result<ViewerEvent> {
        let event = self
            .script
            .pop_front()
            .ok_or_else(|| ViewerError::backend("script exhausted"))?;
        if let ViewerEvent::Resize(vp) = event {
            self.viewport = vp;
            self.surface.resize(vp.width, vp.height);
        }
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(ignore_errors: bool) -> Config {
    let mut cfg = ConfigFile::default();
    cfg.merge_cli(&CliOverrides {
        ignore_errors,
        ..CliOverrides::default()
    });
    cfg.resolve()
}

fn jobs(args: &[&str]) -> Vec<DocumentJob> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    viewer::plan_jobs(&args)
}

fn renderer(pages: usize) -> (MemoryRenderer, Rc<RefCell<Vec<String>>>) {
    let opened = Rc::new(RefCell::new(Vec::new()));
    (
        MemoryRenderer {
            pages,
            opened: Rc::clone(&opened),
        },
        opened,
    )
}

const NEXT: ViewerEvent = ViewerEvent::Command(Command::Next);
const PREV: ViewerEvent = ViewerEvent::Command(Command::Prev);
const QUIT: ViewerEvent = ViewerEvent::Command(Command::Quit);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_quit_ends_whole_run() {
    let (renderer, opened) = renderer(3);
    let mut backend = ScriptedBackend::new(&[NEXT, QUIT]);
    let outcome = viewer::run(&jobs(&["a", "b"]), &renderer, &mut backend, &config(false));

    assert!(outcome.quit);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(backend.pages(), vec![1, 2]);
    assert_eq!(*opened.borrow(), vec!["a".to_string()]);
}

#[test]
fn test_window_close_counts_as_quit() {
    let (renderer, _) = renderer(3);
    let mut backend = ScriptedBackend::new(&[ViewerEvent::Close]);
    let outcome = viewer::run(&jobs(&["a"]), &renderer, &mut backend, &config(false));
    assert!(outcome.quit);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_single_page_interval_sticks() {
    let (renderer, _) = renderer(5);
    let mut backend = ScriptedBackend::new(&[NEXT, NEXT, PREV, QUIT]);
    let outcome = viewer::run(&jobs(&["a", "1-1,3"]), &renderer, &mut backend, &config(false));

    assert_eq!(backend.pages(), vec![1, 1, 1, 1]);
    assert!(backend.shown.iter().all(|(_, _, end)| *end == 1));
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_prev_walks_below_interval_start() {
    let (renderer, _) = renderer(5);
    let mut backend = ScriptedBackend::new(&[PREV, PREV, NEXT, QUIT]);
    viewer::run(&jobs(&["a", "2-4"]), &renderer, &mut backend, &config(false));
    assert_eq!(backend.pages(), vec![2, 1, 1, 2]);
}

#[test]
fn test_dash_shows_last_page() {
    let (renderer, _) = renderer(7);
    let mut backend = ScriptedBackend::new(&[QUIT]);
    viewer::run(&jobs(&["a", "-"]), &renderer, &mut backend, &config(false));
    assert_eq!(backend.shown, vec![("a".to_string(), 7, 7)]);
}

#[test]
fn test_resize_redraws_same_page() {
    let (renderer, _) = renderer(3);
    let resize = ViewerEvent::Resize(ViewportGeometry::new(50, 400));
    let mut backend = ScriptedBackend::new(&[NEXT, resize, QUIT]);
    viewer::run(&jobs(&["a"]), &renderer, &mut backend, &config(false));

    assert_eq!(backend.pages(), vec![1, 2, 2]);
    assert_eq!(backend.presents, 3);
    assert_eq!(backend.surface.width(), 50);
}

#[test]
fn test_open_failure_stops_run() {
    let (renderer, opened) = renderer(3);
    let mut backend = ScriptedBackend::new(&[QUIT]);
    let outcome = viewer::run(&jobs(&["missing", "a"]), &renderer, &mut backend, &config(false));

    assert!(!outcome.quit);
    assert_eq!(outcome.exit_code(), 1);
    let failure = outcome.failure.expect("failure should be reported");
    assert!(failure.starts_with("cannot draw 'missing'"), "{failure}");
    assert_eq!(*opened.borrow(), vec!["missing".to_string()]);
    assert_eq!(backend.presents, 0);
}

#[test]
fn test_ignore_errors_skips_failed_document() {
    let (renderer, opened) = renderer(3);
    let mut backend = ScriptedBackend::new(&[QUIT]);
    let outcome = viewer::run(&jobs(&["missing", "a"]), &renderer, &mut backend, &config(true));

    assert!(outcome.quit);
    assert!(outcome.failure.is_none());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(opened.borrow().len(), 2);
    assert_eq!(backend.shown, vec![("a".to_string(), 1, 3)]);
}

#[test]
fn test_empty_document_finishes_without_drawing() {
    let (renderer, opened) = renderer(3);
    let mut backend = ScriptedBackend::new(&[]);
    let outcome = viewer::run(&jobs(&["empty", "empty"]), &renderer, &mut backend, &config(false));

    assert!(!outcome.quit);
    assert!(!outcome.errored);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(opened.borrow().len(), 2);
    assert_eq!(backend.presents, 0);
}

#[test]
fn test_render_failure_is_flagged_not_fatal() {
    let (renderer, _) = renderer(3);
    let mut backend = ScriptedBackend::new(&[NEXT, QUIT]);
    let outcome = viewer::run(&jobs(&["broken"]), &renderer, &mut backend, &config(false));

    assert!(outcome.errored);
    assert!(outcome.quit);
    assert_eq!(outcome.exit_code(), 0);
    // Both pages still got a background and a status line.
    assert_eq!(backend.pages(), vec![1, 2]);
    assert_eq!(backend.presents, 2);
    let gray = [0x77, 0x77, 0x77, 0xff];
    assert_eq!(&backend.surface.data()[..4], &gray);
}

#[test]
fn test_backend_failure_stops_run() {
    let (renderer, _) = renderer(3);
    // Script runs dry after the first draw.
    let mut backend = ScriptedBackend::new(&[]);
    let outcome = viewer::run(&jobs(&["a"]), &renderer, &mut backend, &config(false));
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.failure.unwrap().contains("script exhausted"));
}
