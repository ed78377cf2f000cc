//! Template capture from the current frame.

use crate::image::filter::resize_area;
use crate::image::{Frame, OwnedImage};
use crate::template::Template;
use crate::trace::trace_event;
use crate::util::{TrackError, TrackResult};

/// Captures the square patch of side `template_size` centered in `frame`.
///
/// The patch is converted to single-channel intensity and downscaled by
/// `scale` with area averaging, so its scaled side is
/// `round(template_size * scale)`. Fails with `InvalidFrame` when the frame
/// has a zero dimension (stream not ready yet) or cannot contain the crop.
pub fn capture_template(
    frame: &Frame<'_>,
    template_size: usize,
    scale: f32,
) -> TrackResult<Template> {
    if frame.is_empty() || template_size == 0 {
        return Err(TrackError::InvalidFrame);
    }
    if template_size > frame.width() || template_size > frame.height() {
        return Err(TrackError::InvalidFrame);
    }

    let gray = frame.to_luma()?;
    let x0 = frame.width() / 2 - template_size / 2;
    let y0 = frame.height() / 2 - template_size / 2;
    let patch = gray.view().roi(x0, y0, template_size, template_size)?;
    let full = OwnedImage::from_view(patch)?;
    let scaled = resize_area(full.view(), scale)?;

    trace_event!(
        "template_captured",
        side = template_size,
        scaled_side = scaled.width()
    );
    Ok(Template::new(full, scaled))
}
