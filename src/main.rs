//! Headless shell driving the pageflow viewer engine
//!
//! Opens a document, waits for the initial render window, then
//! optionally sweeps through the document, commits a zoom change and
//! runs a dictionary lookup, printing one line per engine event.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{Config, WriteLogger};

use pageflow::backend::DocumentBackend;
use pageflow::dict::{Definition, LookupOutcome, LookupService, MiniDictionary, Sense};
use pageflow::settings::Settings;
use pageflow::viewer::{ViewerEvent, ViewportController};

#[derive(Parser, Debug)]
#[command(name = "pageflow", about = "Headless driver for the pageflow viewer engine")]
struct Cli {
    /// Document to open
    path: PathBuf,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "800x1000")]
    viewport: String,

    /// Zoom level to preview and commit after the initial load
    #[arg(long)]
    zoom: Option<u16>,

    /// Sweep-scroll through the whole document, one viewport at a time
    #[arg(long)]
    sweep: bool,

    /// Look up a term in the built-in demo dictionary
    #[arg(long)]
    lookup: Option<String>,

    /// Log file path
    #[arg(long, default_value = "pageflow.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&cli.log_file)?,
    )?;
    info!("starting pageflow shell");

    let (width, height) = parse_viewport(&cli.viewport)?;
    let settings = Settings::load();

    let backend = document_backend()?;
    let mut controller =
        match ViewportController::open(Arc::clone(&backend), &cli.path, &settings) {
            Ok(controller) => controller,
            Err(e) => {
                error!("load failed: {e}");
                print_event(&ViewerEvent::LoadFailed {
                    reason: e.to_string(),
                });
                bail!("load failed: {e}");
            }
        };

    controller.set_viewport(width, height);
    drive_until_loaded(&mut controller, Duration::from_secs(30))?;

    if let Some(zoom) = cli.zoom {
        controller.zoom_preview(zoom, Instant::now());
        drain(&mut controller);
        // Let the debounce lapse so the commit fires on the next tick.
        std::thread::sleep(Duration::from_millis(settings.zoom_debounce_ms + 50));
        controller.tick(Instant::now());
        drain(&mut controller);
        drive_until_loaded(&mut controller, Duration::from_secs(30))?;
    }

    if cli.sweep {
        loop {
            let before = controller.scroll();
            controller.scroll_by(height);
            if (controller.scroll() - before).abs() < f32::EPSILON {
                break;
            }
            drive_until_loaded(&mut controller, Duration::from_secs(30))?;
        }
        println!(
            "sweep done: {} of {} pages resident",
            controller.resident_pages(),
            controller.page_count()
        );
    }

    if let Some(term) = cli.lookup {
        run_lookup(&term)?;
    }

    info!("pageflow shell done");
    Ok(())
}

#[cfg(feature = "pdf")]
fn document_backend() -> Result<Arc<dyn DocumentBackend>> {
    Ok(Arc::new(pageflow::backend::pdf::MupdfBackend))
}

#[cfg(not(feature = "pdf"))]
fn document_backend() -> Result<Arc<dyn DocumentBackend>> {
    bail!("this build has no document backend; rebuild with the `pdf` feature")
}

fn parse_viewport(raw: &str) -> Result<(f32, f32)> {
    let (w, h) = raw
        .split_once('x')
        .with_context(|| format!("viewport must be WIDTHxHEIGHT, got {raw:?}"))?;
    Ok((
        w.parse::<f32>().context("viewport width")?,
        h.parse::<f32>().context("viewport height")?,
    ))
}

/// Tick the controller until the render window is fully loaded.
fn drive_until_loaded(controller: &mut ViewportController, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        controller.tick(Instant::now());
        drain(controller);
        if controller.window_loaded() {
            return Ok(());
        }
        if Instant::now() > deadline {
            bail!("timed out waiting for the render window to load");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn drain(controller: &mut ViewportController) {
    for event in controller.drain_events() {
        print_event(&event);
    }
}

fn print_event(event: &ViewerEvent) {
    match event {
        ViewerEvent::DocumentLayoutReady(sizes) => {
            println!("layout ready: {} pages", sizes.len());
        }
        ViewerEvent::PageImageReady {
            page,
            image,
            rendered_zoom,
        } => {
            println!(
                "page {page} ready: {}x{} at {rendered_zoom}%",
                image.width, image.height
            );
        }
        ViewerEvent::LoadFailed { reason } => println!("load failed: {reason}"),
        ViewerEvent::ZoomPreviewChanged(level) => println!("zoom preview: {level}%"),
        ViewerEvent::ZoomCommitted(level) => println!("zoom committed: {level}%"),
        ViewerEvent::SelectionChanged(text) => {
            println!("selection changed: {} chars", text.chars().count());
        }
        ViewerEvent::SelectionHighlightsChanged { page, rects } => {
            println!("highlights on page {page}: {} blocks", rects.len());
        }
    }
}

fn run_lookup(term: &str) -> Result<()> {
    let service = LookupService::spawn(demo_dictionary());
    service.lookup(term);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(outcome) = service.poll().pop() {
            match outcome {
                LookupOutcome::Found(definition) => {
                    let phonetic = definition.phonetic.as_deref().unwrap_or("-");
                    println!("{} {phonetic}", definition.word);
                    for sense in &definition.senses {
                        println!("  {}: {}", sense.part_of_speech, sense.text);
                    }
                }
                LookupOutcome::NotFound { term } => {
                    println!("no definition found for {term:?}");
                }
                LookupOutcome::Failed { term, reason } => {
                    println!("lookup failed for {term:?}: {reason}");
                }
            }
            return Ok(());
        }
        if Instant::now() > deadline {
            bail!("dictionary lookup timed out");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn demo_dictionary() -> MiniDictionary {
    let mut dict = MiniDictionary::new();
    dict.insert(Definition {
        word: "praise".to_string(),
        phonetic: Some("/preiz/".to_string()),
        senses: vec![
            Sense {
                part_of_speech: "noun".to_string(),
                text: "The expression of approval or admiration for someone or something."
                    .to_string(),
            },
            Sense {
                part_of_speech: "verb".to_string(),
                text: "To express warm approval or admiration of; to commend the worth of."
                    .to_string(),
            },
        ],
    });
    dict.insert(Definition {
        word: "viewport".to_string(),
        phonetic: None,
        senses: vec![Sense {
            part_of_speech: "noun".to_string(),
            text: "The region of a document currently visible on screen.".to_string(),
        }],
    });
    dict
}
