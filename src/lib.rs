//! Patchtrack is a real-time template tracking core for live video streams.
//!
//! The user captures one or two small reference patches from the stream;
//! every subsequent display-refresh step locates the best ZNCC match of
//! those patches in the current frame and reports a normalized screen
//! position to a consumer. Camera acquisition, frame delivery and the
//! position consumer sit behind the traits in [`session`]; the optional
//! `rayon` feature parallelizes the scan within a tick.

pub mod config;
pub mod image;
pub mod matcher;
pub mod session;
pub mod template;
pub mod track;
pub mod util;

pub(crate) mod trace;

pub use config::TrackerConfig;
pub use image::{Frame, ImageView, OwnedImage, PixelFormat};
pub use matcher::MatchResult;
pub use session::{
    DeviceSelector, EventSink, FrameSource, FrameSourceProvider, Session, SessionState,
};
pub use template::{capture_template, Template, TemplateStore};
pub use track::{LoopState, NormalizedPosition, TickOutcome, TrackingLoop};
pub use util::{TrackError, TrackResult};
