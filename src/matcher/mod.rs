//! Multi-template best-match engine.
//!
//! Every tracking tick converts the current frame to intensity, smooths it,
//! downscales it to the templates' matching resolution and keeps the single
//! best ZNCC peak across all stored templates.

use crate::config::TrackerConfig;
use crate::image::filter::{gaussian_blur_3x3, resize_area};
use crate::image::{Frame, ImageView, OwnedImage};
use crate::template::TemplateStore;
use crate::trace::trace_span;
use crate::util::TrackResult;

pub mod zncc;

use zncc::Peak;

/// Best match across all stored templates, in scaled-frame coordinates.
///
/// Recomputed from scratch every tick; no match history is kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    /// ZNCC score of the winning placement.
    pub score: f32,
    /// Column of the placement's top-left corner.
    pub x: usize,
    /// Row of the placement's top-left corner.
    pub y: usize,
    /// Width of the matched template's scaled representation.
    pub tpl_width: usize,
    /// Height of the matched template's scaled representation.
    pub tpl_height: usize,
}

/// Prepares a raw frame for matching.
///
/// Intensity conversion, 3x3 Gaussian smoothing, then area downscale by
/// `scale` — the same treatment the templates' scaled representations went
/// through, so both correlation operands share resolution.
pub fn preprocess_frame(frame: &Frame<'_>, scale: f32) -> TrackResult<OwnedImage> {
    let gray = frame.to_luma()?;
    let smoothed = gaussian_blur_3x3(gray.view())?;
    resize_area(smoothed.view(), scale)
}

/// Returns the best match of any stored template in the scaled frame.
///
/// Templates are evaluated in insertion order and only a strictly better
/// score replaces the running best, so ties resolve to the first-inserted
/// template. `None` means no template produced a scoreable placement (flat
/// windows everywhere, or templates larger than the scaled frame).
pub fn best_match(
    scaled_frame: ImageView<'_, u8>,
    store: &TemplateStore,
    cfg: &TrackerConfig,
) -> Option<MatchResult> {
    let _span = trace_span!("best_match", templates = store.len()).entered();

    let mut best: Option<MatchResult> = None;
    for template in store.templates() {
        let plan = template.plan();
        let peak = scan(scaled_frame, plan, cfg);
        if let Some(Peak { x, y, score }) = peak {
            let better = match &best {
                Some(current) => score > current.score,
                None => true,
            };
            if better {
                best = Some(MatchResult {
                    score,
                    x,
                    y,
                    tpl_width: plan.width(),
                    tpl_height: plan.height(),
                });
            }
        }
    }
    best
}

#[cfg(feature = "rayon")]
fn scan(image: ImageView<'_, u8>, plan: &zncc::ZnccPlan, cfg: &TrackerConfig) -> Option<Peak> {
    if cfg.parallel {
        zncc::best_zncc_par(image, plan, cfg.min_var_i)
    } else {
        zncc::best_zncc(image, plan, cfg.min_var_i)
    }
}

#[cfg(not(feature = "rayon"))]
fn scan(image: ImageView<'_, u8>, plan: &zncc::ZnccPlan, cfg: &TrackerConfig) -> Option<Peak> {
    zncc::best_zncc(image, plan, cfg.min_var_i)
}
