//! Shared error types.

pub mod error;

pub use error::{TrackError, TrackResult};
