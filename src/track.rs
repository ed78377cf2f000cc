//! The tracking loop state machine.
//!
//! One tick per display-refresh step: pull the current frame, run the match
//! engine, and emit a normalized position when the best score clears the
//! threshold. Ticks never overlap; all per-tick scratch buffers are dropped
//! on every exit path by scope.

use crate::config::TrackerConfig;
use crate::matcher::{self, MatchResult};
use crate::session::{EventSink, FrameSource};
use crate::template::TemplateStore;
use crate::trace::trace_event;
use crate::util::TrackResult;

/// Tracked location as fractions of the full frame size, in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
}

/// Lifecycle state of the tracking loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Fewer templates than required; ticks do no matching.
    WaitingForTemplates,
    /// Matching runs every tick.
    Armed,
    /// Explicitly stopped; ticks are no-ops.
    Cancelled,
}

/// What a single tick did, for drivers and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// The loop is cancelled.
    Cancelled,
    /// Not enough templates yet; no matching performed.
    Waiting,
    /// The frame source had no usable frame.
    FrameUnready,
    /// Matching ran but nothing cleared the score threshold.
    BelowThreshold {
        /// Best score seen this tick; `None` when no placement was scoreable.
        score: Option<f32>,
    },
    /// A position was emitted to the sink.
    Reported(NormalizedPosition),
}

/// Explicit repeating tracking task.
///
/// The driver re-invokes [`TrackingLoop::tick`] once per scheduler step
/// until [`TrackingLoop::cancel`] is called; cancellation is a first-class
/// state, not a best-effort flag check.
pub struct TrackingLoop {
    state: LoopState,
    cfg: TrackerConfig,
}

impl TrackingLoop {
    /// Creates a loop waiting for templates.
    pub fn new(cfg: TrackerConfig) -> Self {
        Self {
            state: LoopState::WaitingForTemplates,
            cfg,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Enables matching. No-op unless the loop is waiting for templates.
    pub fn arm(&mut self) {
        if self.state == LoopState::WaitingForTemplates {
            self.state = LoopState::Armed;
            trace_event!("tracking_armed");
        }
    }

    /// Suspends matching until templates are captured again (recalibration).
    /// No-op on a cancelled loop.
    pub fn disarm(&mut self) {
        if self.state == LoopState::Armed {
            self.state = LoopState::WaitingForTemplates;
        }
    }

    /// Stops the loop for good. Idempotent.
    pub fn cancel(&mut self) {
        self.state = LoopState::Cancelled;
    }

    /// Runs one tracking step.
    ///
    /// A sub-threshold score is not an error and emits nothing; there is no
    /// "no-match" signal. The template count is re-checked even while armed
    /// so a recalibration that emptied the store mid-generation is tolerated.
    pub fn tick(
        &mut self,
        source: &mut dyn FrameSource,
        store: &TemplateStore,
        sink: &mut dyn EventSink,
    ) -> TrackResult<TickOutcome> {
        match self.state {
            LoopState::Cancelled => return Ok(TickOutcome::Cancelled),
            LoopState::WaitingForTemplates => return Ok(TickOutcome::Waiting),
            LoopState::Armed => {}
        }
        if !store.is_armed() {
            return Ok(TickOutcome::Waiting);
        }

        let Some(frame) = source.current_frame() else {
            return Ok(TickOutcome::FrameUnready);
        };
        if frame.is_empty() {
            return Ok(TickOutcome::FrameUnready);
        }
        let frame_width = frame.width();
        let frame_height = frame.height();

        // Scratch lives only for this tick.
        let scaled = matcher::preprocess_frame(&frame, self.cfg.scale)?;
        let Some(best) = matcher::best_match(scaled.view(), store, &self.cfg) else {
            return Ok(TickOutcome::BelowThreshold { score: None });
        };

        if best.score > self.cfg.min_match_score {
            let position = normalize(&best, self.cfg.scale, frame_width, frame_height);
            sink.position(position);
            trace_event!("position", x = position.x, y = position.y);
            Ok(TickOutcome::Reported(position))
        } else {
            Ok(TickOutcome::BelowThreshold {
                score: Some(best.score),
            })
        }
    }
}

/// Converts a scaled-coordinate match to a normalized full-frame position.
///
/// The match center is `(location + template_size / 2) / scale`, then divided
/// by the full frame dimensions.
fn normalize(
    best: &MatchResult,
    scale: f32,
    frame_width: usize,
    frame_height: usize,
) -> NormalizedPosition {
    let scale = f64::from(scale);
    let center_x = (best.x as f64 + best.tpl_width as f64 / 2.0) / scale;
    let center_y = (best.y as f64 + best.tpl_height as f64 / 2.0) / scale;
    NormalizedPosition {
        x: center_x / frame_width as f64,
        y: center_y / frame_height as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, LoopState, TrackingLoop};
    use crate::config::TrackerConfig;
    use crate::matcher::MatchResult;

    #[test]
    fn normalize_centers_the_match() {
        let best = MatchResult {
            score: 1.0,
            x: 118,
            y: 78,
            tpl_width: 84,
            tpl_height: 84,
        };
        // Scaled frame is 320x240; match center lands at frame center.
        let pos = normalize(&best, 0.5, 640, 480);
        assert!((pos.x - 0.5).abs() < 1e-9);
        assert!((pos.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn arm_and_disarm_transitions() {
        let mut tracker = TrackingLoop::new(TrackerConfig::default());
        assert_eq!(tracker.state(), LoopState::WaitingForTemplates);
        tracker.arm();
        assert_eq!(tracker.state(), LoopState::Armed);
        tracker.disarm();
        assert_eq!(tracker.state(), LoopState::WaitingForTemplates);

        tracker.cancel();
        tracker.arm();
        assert_eq!(tracker.state(), LoopState::Cancelled);
    }
}
