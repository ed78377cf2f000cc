//! Helpers for loading frames and templates via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Used by the CLI to
//! replay directories of still images as a synthetic camera.

use crate::image::{ImageView, OwnedImage};
use crate::util::{TrackError, TrackResult};
use std::path::Path;

/// Creates a borrowed view over a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> TrackResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Copies a grayscale image buffer into an owned image.
pub fn owned_from_gray_image(img: &image::GrayImage) -> TrackResult<OwnedImage> {
    OwnedImage::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> TrackResult<OwnedImage> {
    let img = image::open(path).map_err(|err| TrackError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_gray_image(&img.to_luma8())
}
