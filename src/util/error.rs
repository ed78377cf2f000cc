//! Error types for patchtrack.

use thiserror::Error;

/// Result alias for patchtrack operations.
pub type TrackResult<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while capturing templates or running a session.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrackError {
    /// An image was constructed with a zero width or height.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A view stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// A backing buffer is too small for the requested dimensions.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A requested region does not fit inside the image.
    #[error("roi {width}x{height}+{x}+{y} out of bounds for {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A downscale factor is outside the supported (0, 1] range.
    #[error("invalid downscale factor {scale}")]
    InvalidScale { scale: f32 },
    /// The current frame has a zero dimension or cannot hold a template crop.
    #[error("frame is empty or too small for capture")]
    InvalidFrame,
    /// The template store already holds the maximum number of templates.
    #[error("template store is full ({capacity} templates); recalibrate first")]
    StoreFull { capacity: usize },
    /// An operation that needs a live stream was called with none open.
    #[error("no active camera stream")]
    NoActiveStream,
    /// The camera could not be acquired (permission denied, busy, missing).
    #[error("camera unavailable: {reason}")]
    DeviceUnavailable { reason: String },
    /// The stream never produced usable metadata within the bounded wait.
    #[error("stream did not become ready within {waited_ms} ms")]
    StreamTimeout { waited_ms: u64 },
    /// The vision backend did not report ready within the bounded wait.
    #[error("vision backend not ready after {waited_ms} ms")]
    DependencyUnready { waited_ms: u64 },
    /// An image file could not be read or decoded.
    #[cfg(feature = "image-io")]
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}
