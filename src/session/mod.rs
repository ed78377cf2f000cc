//! Session orchestration: device selection, loop lifecycle, recalibration.
//!
//! A [`Session`] owns the template store, the frame-relay and tracking loops,
//! and the open frame source. Exactly one session drives those resources at a
//! time; starting a new stream tears the previous one down first. Scheduling
//! is cooperative: the driver calls [`Session::step`] once per display
//! refresh, and the relay and tracking chains interleave on the same thread
//! with no parallelism between steps.

use std::thread;
use std::time::Instant;

use crate::config::TrackerConfig;
use crate::image::Frame;
use crate::template::{capture_template, TemplateStore};
use crate::trace::trace_event;
use crate::track::{LoopState, NormalizedPosition, TickOutcome, TrackingLoop};
use crate::util::{TrackError, TrackResult};

/// Supplies the current raw image on demand.
///
/// The returned frame borrows the source and must not be retained beyond one
/// processing step. `None` means the stream has no usable frame yet.
pub trait FrameSource {
    /// Stream dimensions in pixels.
    fn frame_size(&self) -> (usize, usize);
    /// The most recent frame, if one is available.
    fn current_frame(&mut self) -> Option<Frame<'_>>;
}

/// Picks which camera device to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceSelector {
    /// First available device.
    First,
    /// Device at a fixed enumeration index.
    Index(usize),
    /// First device whose label contains the substring, case-insensitive;
    /// providers fall back to the first device when nothing matches.
    Label(String),
}

/// Acquires camera streams and reports vision-backend readiness.
pub trait FrameSourceProvider {
    /// The stream type this provider opens.
    type Source: FrameSource;

    /// True once the vision backend is loaded and usable.
    fn ready(&mut self) -> bool;

    /// Opens a stream for the selected device.
    ///
    /// Failures map to [`TrackError::DeviceUnavailable`] (permission denied,
    /// device busy, no matching device) or [`TrackError::StreamTimeout`]
    /// (metadata never arrived).
    fn open(&mut self, selector: &DeviceSelector) -> TrackResult<Self::Source>;
}

/// Receives session outputs. All methods are fire-and-forget: a slow or
/// absent consumer never blocks the loops.
pub trait EventSink {
    /// Sent exactly once per session, the first time a usable frame exists.
    fn camera_ready(&mut self);
    /// A qualifying match, normalized to `[0, 1]` frame fractions.
    fn position(&mut self, position: NormalizedPosition);
    /// Relays the current frame to the display consumer.
    fn video_frame(&mut self, _frame: &Frame<'_>) {}
    /// Shows or hides the capture-guidance affordance.
    fn guide_visible(&mut self, _visible: bool) {}
}

/// Externally observable session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No stream open.
    Idle,
    /// Waiting for the vision backend or the camera.
    AwaitingCamera,
    /// Streaming; matching disabled until enough templates are captured.
    Streaming { templates: usize },
    /// Streaming with a full store; matching runs every step.
    Tracking,
}

/// Frame-relay chain: forwards usable frames to the sink and owns the
/// one-shot camera-ready signal.
struct FrameRelay {
    camera_ready_sent: bool,
    cancelled: bool,
}

impl FrameRelay {
    fn new() -> Self {
        Self {
            camera_ready_sent: false,
            cancelled: false,
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Relays the current frame; skips unready frames and reschedules.
    fn tick(&mut self, source: &mut dyn FrameSource, sink: &mut dyn EventSink) -> bool {
        if self.cancelled {
            return false;
        }
        let Some(frame) = source.current_frame() else {
            return false;
        };
        if frame.is_empty() {
            return false;
        }
        sink.video_frame(&frame);
        if !self.camera_ready_sent {
            sink.camera_ready();
            self.camera_ready_sent = true;
            trace_event!("camera_ready");
        }
        true
    }
}

/// One live tracking session.
///
/// Owns every mutable resource the loops touch, replacing the ambient
/// globals of earlier designs; superseding a session goes through
/// [`Session::start`], which cancels both loop chains and drops the stream
/// before acquiring new resources.
pub struct Session<P: FrameSourceProvider, S: EventSink> {
    provider: P,
    sink: S,
    cfg: TrackerConfig,
    state: SessionState,
    source: Option<P::Source>,
    template_size: usize,
    store: TemplateStore,
    relay: FrameRelay,
    tracker: TrackingLoop,
}

impl<P: FrameSourceProvider, S: EventSink> Session<P, S> {
    /// Creates an idle session.
    pub fn new(provider: P, sink: S, cfg: TrackerConfig) -> Self {
        let store = TemplateStore::new(cfg.max_templates);
        let tracker = TrackingLoop::new(cfg.clone());
        Self {
            provider,
            sink,
            cfg,
            state: SessionState::Idle,
            source: None,
            template_size: 0,
            store,
            relay: FrameRelay::new(),
            tracker,
        }
    }

    /// Starts (or restarts) streaming from the selected device.
    ///
    /// Any previous stream and loops are torn down first. The vision backend
    /// is polled at `ready_poll_interval` up to `ready_timeout`; on any
    /// failure the session is left fully torn down, never half-initialized.
    /// Captured templates survive a device switch; if the store is already
    /// full, tracking resumes on the new stream immediately.
    pub fn start(&mut self, selector: &DeviceSelector) -> TrackResult<()> {
        self.teardown();
        self.state = SessionState::AwaitingCamera;

        if let Err(err) = self.try_open(selector) {
            self.state = SessionState::Idle;
            trace_event!("session_start_failed");
            return Err(err);
        }

        if self.store.is_armed() {
            self.tracker.arm();
            self.state = SessionState::Tracking;
        } else {
            self.state = SessionState::Streaming {
                templates: self.store.len(),
            };
        }
        self.sink.guide_visible(!self.store.is_armed());
        trace_event!("session_started", template_size = self.template_size);
        Ok(())
    }

    fn try_open(&mut self, selector: &DeviceSelector) -> TrackResult<()> {
        self.wait_for_backend()?;
        let source = self.provider.open(selector)?;
        let (width, height) = source.frame_size();
        if width == 0 || height == 0 {
            return Err(TrackError::DeviceUnavailable {
                reason: "stream reported zero dimensions".to_owned(),
            });
        }
        self.template_size = self.cfg.template_size(width, height);
        self.source = Some(source);
        self.relay = FrameRelay::new();
        self.tracker = TrackingLoop::new(self.cfg.clone());
        Ok(())
    }

    /// Bounded readiness wait, replacing the indefinite poll of the original
    /// design.
    fn wait_for_backend(&mut self) -> TrackResult<()> {
        let started = Instant::now();
        loop {
            if self.provider.ready() {
                return Ok(());
            }
            if started.elapsed() >= self.cfg.ready_timeout {
                return Err(TrackError::DependencyUnready {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            thread::sleep(self.cfg.ready_poll_interval);
        }
    }

    /// Runs one cooperative scheduler step: relay tick, then tracking tick.
    pub fn step(&mut self) -> TrackResult<TickOutcome> {
        let Some(source) = self.source.as_mut() else {
            return Err(TrackError::NoActiveStream);
        };
        self.relay.tick(source, &mut self.sink);
        self.tracker.tick(source, &self.store, &mut self.sink)
    }

    /// Captures a template from the current frame (inbound capture trigger).
    ///
    /// Returns the new template count. Fails with `StoreFull` once the store
    /// holds `max_templates`; recalibrate to capture again. Arms the tracking
    /// loop when the store fills.
    pub fn capture_template(&mut self) -> TrackResult<usize> {
        let Some(source) = self.source.as_mut() else {
            return Err(TrackError::NoActiveStream);
        };
        if self.store.is_armed() {
            return Err(TrackError::StoreFull {
                capacity: self.store.capacity(),
            });
        }
        let Some(frame) = source.current_frame() else {
            return Err(TrackError::InvalidFrame);
        };
        let template = capture_template(&frame, self.template_size, self.cfg.scale)?;

        let count = self.store.push(template)?;
        trace_event!("template_stored", count = count);
        if self.store.is_armed() {
            self.tracker.arm();
            self.state = SessionState::Tracking;
            self.sink.guide_visible(false);
        } else {
            self.state = SessionState::Streaming { templates: count };
        }
        Ok(count)
    }

    /// Discards all templates and suspends matching until two fresh captures
    /// arrive (inbound recalibration trigger). Idempotent.
    pub fn recalibrate(&mut self) {
        self.store.clear();
        self.tracker.disarm();
        if self.source.is_some() {
            self.state = SessionState::Streaming { templates: 0 };
            self.sink.guide_visible(true);
        }
        trace_event!("recalibrated");
    }

    /// Cancels both loops and releases the stream.
    pub fn stop(&mut self) {
        self.teardown();
        self.state = SessionState::Idle;
    }

    fn teardown(&mut self) {
        self.relay.cancel();
        self.tracker.cancel();
        self.source = None;
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Template side length fixed for this session, 0 before streaming.
    pub fn template_size(&self) -> usize {
        self.template_size
    }

    /// Number of captured templates.
    pub fn templates_captured(&self) -> usize {
        self.store.len()
    }

    /// Tracking-loop lifecycle state.
    pub fn loop_state(&self) -> LoopState {
        self.tracker.state()
    }

    /// Consumes the session and returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
