//! Viewer driver: walks the documents given on the command line.
//!
//! Module structure:
//! - [`navigation`]: per-document state machine (range cursor, render step)
//!
//! Each document is opened, its range shown until the user quits, then
//! closed. Quitting ends the whole run; a document that cannot be shown
//! either stops the run or is skipped, depending on `ignore_errors`.

pub mod navigation;

use std::path::PathBuf;

use log::{error, info, warn};

use crate::backend::Backend;
use crate::config::Config;
use crate::document::Renderer;
use crate::range::is_range;
use navigation::{NavigationController, RangeExit};

/// Range used for a document given without one: every page.
pub const DEFAULT_RANGE: &str = "1-";

/// One document and the pages to show from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub path: PathBuf,
    pub range: String,
}

/// Pair each document argument with the range token that follows it.
///
/// The first argument is always a document, even if it looks like a range.
pub fn plan_jobs(args: &[String]) -> Vec<DocumentJob> {
    let mut jobs = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(path) = iter.next() {
        let range = iter
            .next_if(|arg| is_range(arg))
            .map_or_else(|| DEFAULT_RANGE.to_string(), String::clone);
        jobs.push(DocumentJob {
            path: PathBuf::from(path),
            range,
        });
    }
    jobs
}

/// How a run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The user quit.
    pub quit: bool,
    /// A page failed to render or place somewhere along the way.
    pub errored: bool,
    /// The document error that stopped the run, ready for the user.
    pub failure: Option<String>,
}

impl Outcome {
    /// 0 when the user quit or everything drew cleanly, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() || (!self.quit && self.errored) {
            1
        } else {
            0
        }
    }
}

/// Show every job on `backend`, in order.
pub fn run<B: Backend + ?Sized>(
    jobs: &[DocumentJob],
    renderer: &dyn Renderer,
    backend: &mut B,
    config: &Config,
) -> Outcome {
    let mut nav = NavigationController::new(config.fit)
        .with_background(config.background)
        .with_strict_ranges(config.strict_ranges);
    let mut outcome = Outcome::default();

    for job in jobs {
        info!("viewer: {} [{}]", job.path.display(), job.range);
        let result = nav
            .open(renderer, &job.path)
            .and_then(|()| nav.run(backend, &job.range));
        nav.close_document();

        match result {
            Ok(RangeExit::Quit) => {
                outcome.quit = true;
                break;
            }
            Ok(RangeExit::Finished) => {}
            Err(e) if config.ignore_errors => {
                warn!("ignoring error in '{}': {e}", job.path.display());
            }
            Err(e) => {
                error!("viewer: {}: {e}", job.path.display());
                outcome.failure = Some(format!("cannot draw '{}': {e}", job.path.display()));
                break;
            }
        }
    }

    outcome.errored = nav.errored();
    outcome
}
