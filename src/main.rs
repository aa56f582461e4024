use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fitview::backend::{self, BackendKind};
use fitview::config::{self, CliOverrides};
use fitview::render::TypstRenderer;
use fitview::viewer;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FITVIEW_BUILD_GIT_HASH"),
    ", ",
    env!("FITVIEW_BUILD_PROFILE"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "fitview",
    about = "Page through Typst documents in a terminal or window",
    version,
    long_version = LONG_VERSION,
    allow_negative_numbers = true
)]
struct Cli {
    /// Documents to show, each optionally followed by a page range
    /// (`3`, `2-5`, `4-`, `1-3,7`, or `-` for the last page)
    #[arg(required = true, value_name = "DOCUMENT [RANGE]")]
    args: Vec<String>,

    /// Stretch pages to fill the viewport instead of keeping their aspect ratio
    #[arg(short = 'f', long)]
    fit: bool,

    /// Show pages in a window (same as `--backend window`)
    #[arg(short = 'w', long)]
    windowed: bool,

    /// Display backend
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Rendering resolution in dpi; pages that fit at this size are not scaled
    #[arg(short = 'r', long, value_name = "DPI")]
    resolution: Option<f32>,

    /// Rotate pages clockwise by this many degrees
    #[arg(short = 'R', long, value_name = "DEGREES")]
    rotate: Option<f32>,

    /// Skip documents that cannot be shown instead of stopping
    #[arg(short = 'i', long)]
    ignore_errors: bool,

    /// Reject malformed page ranges instead of reading them leniently
    #[arg(long)]
    strict_ranges: bool,

    /// Log output file path (enables logging when specified)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // The terminal belongs to the viewer: log only to a file.
    if let Some(log_path) = &cli.log {
        match std::fs::File::create(log_path) {
            Ok(file) => env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init(),
            Err(e) => {
                eprintln!("Error: cannot open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        }
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let msg = format!("{e:#}");
            if msg.contains("[BUG]") {
                eprintln!("\x1b[1;31m{msg}\x1b[0m");
            } else {
                eprintln!("Error: {msg}");
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut cfg = config::load_config()?;
    let backend_kind = match (cli.backend, cli.windowed) {
        (Some(kind), _) => Some(kind),
        (None, true) => Some(BackendKind::Window),
        (None, false) => None,
    };
    cfg.merge_cli(&CliOverrides {
        stretch: cli.fit,
        resolution: cli.resolution,
        rotation: cli.rotate,
        ignore_errors: cli.ignore_errors,
        strict_ranges: cli.strict_ranges,
        backend: backend_kind,
    });
    let config = cfg.resolve();

    let jobs = viewer::plan_jobs(&cli.args);
    info!("fitview {LONG_VERSION}: {} document(s)", jobs.len());

    let renderer = TypstRenderer::new();
    let mut display = backend::open(config.backend, &config)
        .with_context(|| format!("cannot open {:?} backend", config.backend))?;
    let outcome = viewer::run(&jobs, &renderer, display.as_mut(), &config);
    // Restore the terminal before reporting.
    drop(display);

    if let Some(msg) = &outcome.failure {
        eprintln!("error: {msg}");
    }
    info!("fitview: done {outcome:?}");
    Ok(outcome.exit_code())
}
