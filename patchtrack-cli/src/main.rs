use clap::Parser;
use patchtrack::image::io::load_gray_image;
use patchtrack::{
    DeviceSelector, EventSink, Frame, FrameSource, FrameSourceProvider, NormalizedPosition,
    OwnedImage, PixelFormat, Session, TickOutcome, TrackResult, TrackerConfig,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Patchtrack CLI: replay image frames through a tracking session")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackerConfigJson {
    scale: f32,
    min_match_score: f32,
    template_fraction: f32,
    max_templates: usize,
    ready_poll_interval_ms: u64,
    ready_timeout_ms: u64,
    parallel: bool,
}

impl Default for TrackerConfigJson {
    fn default() -> Self {
        let cfg = TrackerConfig::default();
        Self {
            scale: cfg.scale,
            min_match_score: cfg.min_match_score,
            template_fraction: cfg.template_fraction,
            max_templates: cfg.max_templates,
            ready_poll_interval_ms: cfg.ready_poll_interval.as_millis() as u64,
            ready_timeout_ms: cfg.ready_timeout.as_millis() as u64,
            parallel: cfg.parallel,
        }
    }
}

impl From<TrackerConfigJson> for TrackerConfig {
    fn from(value: TrackerConfigJson) -> Self {
        TrackerConfig {
            scale: value.scale,
            min_match_score: value.min_match_score,
            template_fraction: value.template_fraction,
            max_templates: value.max_templates,
            min_var_i: TrackerConfig::default().min_var_i,
            ready_poll_interval: Duration::from_millis(value.ready_poll_interval_ms),
            ready_timeout: Duration::from_millis(value.ready_timeout_ms),
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    /// Directory of image files replayed in filename order as the stream.
    frames_dir: String,
    /// Steps at which a template capture is triggered (before that step runs).
    capture_steps: Vec<usize>,
    /// Total scheduler steps; 0 means one step per frame.
    steps: usize,
    output_path: Option<String>,
    tracker: TrackerConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_dir: String::new(),
            capture_steps: vec![0, 1],
            steps: 0,
            output_path: None,
            tracker: TrackerConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PositionRecord {
    step: usize,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct Output {
    template_size: usize,
    positions: Vec<PositionRecord>,
}

/// Replays a fixed frame list; the driver advances the shared cursor once
/// per scheduler step.
struct ReplaySource {
    frames: Rc<Vec<OwnedImage>>,
    cursor: Rc<Cell<usize>>,
    size: (usize, usize),
}

impl FrameSource for ReplaySource {
    fn frame_size(&self) -> (usize, usize) {
        self.size
    }

    fn current_frame(&mut self) -> Option<Frame<'_>> {
        let img = self.frames.get(self.cursor.get())?;
        Frame::new(img.data(), img.width(), img.height(), PixelFormat::Luma8).ok()
    }
}

struct ReplayProvider {
    frames: Rc<Vec<OwnedImage>>,
    cursor: Rc<Cell<usize>>,
}

impl FrameSourceProvider for ReplayProvider {
    type Source = ReplaySource;

    fn ready(&mut self) -> bool {
        true
    }

    fn open(&mut self, _selector: &DeviceSelector) -> TrackResult<ReplaySource> {
        let first = &self.frames[0];
        Ok(ReplaySource {
            frames: Rc::clone(&self.frames),
            cursor: Rc::clone(&self.cursor),
            size: (first.width(), first.height()),
        })
    }
}

#[derive(Clone, Default)]
struct CollectingSink {
    step: Rc<Cell<usize>>,
    positions: Rc<RefCell<Vec<PositionRecord>>>,
}

impl EventSink for CollectingSink {
    fn camera_ready(&mut self) {
        tracing::info!("camera ready");
    }

    fn position(&mut self, position: NormalizedPosition) {
        self.positions.borrow_mut().push(PositionRecord {
            step: self.step.get(),
            x: position.x,
            y: position.y,
        });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("patchtrack=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames_dir.is_empty() {
        return Err("frames_dir must be set in the config".into());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&config.frames_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err("frames_dir contains no frames".into());
    }

    let mut frames = Vec::with_capacity(paths.len());
    for path in &paths {
        frames.push(load_gray_image(path)?);
    }
    let steps = if config.steps == 0 {
        frames.len()
    } else {
        config.steps
    };

    let frames = Rc::new(frames);
    let cursor = Rc::new(Cell::new(0usize));
    let provider = ReplayProvider {
        frames: Rc::clone(&frames),
        cursor: Rc::clone(&cursor),
    };
    let sink = CollectingSink::default();
    let step_counter = Rc::clone(&sink.step);
    let positions = Rc::clone(&sink.positions);

    let mut session = Session::new(provider, sink, TrackerConfig::from(config.tracker));
    session.start(&DeviceSelector::First)?;
    let template_size = session.template_size();

    for step in 0..steps {
        step_counter.set(step);
        if config.capture_steps.contains(&step) {
            match session.capture_template() {
                Ok(count) => tracing::info!(step, count, "template captured"),
                Err(err) => eprintln!("capture failed at step {step}: {err}"),
            }
        }
        match session.step()? {
            TickOutcome::Reported(_) | TickOutcome::Waiting => {}
            outcome => tracing::debug!(step, ?outcome, "tick"),
        }
        // Advance the replayed stream, holding the last frame like a camera.
        cursor.set((cursor.get() + 1).min(frames.len() - 1));
    }
    session.stop();

    let output = Output {
        template_size,
        positions: positions.take(),
    };
    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
