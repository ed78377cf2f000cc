//! Zero-mean normalized cross-correlation over dense placements.
//!
//! Template statistics are precomputed once per capture in `ZnccPlan`; the
//! per-tick scan only accumulates the image-side sums. Scores lie in
//! approximately `[-1, 1]` and are invariant to uniform brightness and
//! contrast shifts of the image window.

use crate::image::ImageView;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Precomputed ZNCC statistics for one template image.
pub struct ZnccPlan {
    t_prime: Vec<f32>,
    var_t: f32,
    width: usize,
    height: usize,
}

impl ZnccPlan {
    /// Builds the plan from a template view.
    pub fn new(tpl: ImageView<'_, u8>) -> Self {
        let width = tpl.width();
        let height = tpl.height();
        let n = (width * height) as f32;

        let mut sum = 0.0f32;
        for y in 0..height {
            if let Some(row) = tpl.row(y) {
                for &v in row {
                    sum += f32::from(v);
                }
            }
        }
        let mean = sum / n;

        let mut t_prime = Vec::with_capacity(width * height);
        let mut var_t = 0.0f32;
        for y in 0..height {
            if let Some(row) = tpl.row(y) {
                for &v in row {
                    let d = f32::from(v) - mean;
                    var_t += d * d;
                    t_prime.push(d);
                }
            }
        }

        Self {
            t_prime,
            var_t,
            width,
            height,
        }
    }

    /// Template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total zero-mean template variance.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }
}

/// Best-scoring placement of a plan within an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Column of the placement's top-left corner.
    pub x: usize,
    /// Row of the placement's top-left corner.
    pub y: usize,
    /// ZNCC score at the placement.
    pub score: f32,
}

/// Scans all valid placements and returns the single best peak.
///
/// Returns `None` when the template does not fit in the image, when the
/// template is flat (zero variance), or when every window fails the
/// `min_var_i` variance gate. Ties resolve to the smallest `(y, x)` because
/// only a strictly greater score replaces the running best.
pub fn best_zncc(image: ImageView<'_, u8>, plan: &ZnccPlan, min_var_i: f32) -> Option<Peak> {
    let (max_x, max_y) = placement_range(image, plan)?;
    if plan.var_t <= 1e-8 {
        return None;
    }

    let mut best: Option<Peak> = None;
    for y in 0..=max_y {
        let row_best = best_in_row(image, plan, y, max_x, min_var_i);
        merge_best(&mut best, row_best);
    }
    best
}

/// Row-parallel variant of [`best_zncc`]; bitwise-equivalent to the scalar
/// scan because rows are reduced back in ascending order.
#[cfg(feature = "rayon")]
pub fn best_zncc_par(image: ImageView<'_, u8>, plan: &ZnccPlan, min_var_i: f32) -> Option<Peak> {
    let (max_x, max_y) = placement_range(image, plan)?;
    if plan.var_t <= 1e-8 {
        return None;
    }

    let rows: Vec<Option<Peak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| best_in_row(image, plan, y, max_x, min_var_i))
        .collect();

    let mut best: Option<Peak> = None;
    for row_best in rows {
        merge_best(&mut best, row_best);
    }
    best
}

fn placement_range(image: ImageView<'_, u8>, plan: &ZnccPlan) -> Option<(usize, usize)> {
    if image.width() < plan.width || image.height() < plan.height {
        return None;
    }
    Some((image.width() - plan.width, image.height() - plan.height))
}

fn merge_best(best: &mut Option<Peak>, candidate: Option<Peak>) {
    if let Some(peak) = candidate {
        match best {
            Some(current) if peak.score <= current.score => {}
            _ => *best = Some(peak),
        }
    }
}

fn best_in_row(
    image: ImageView<'_, u8>,
    plan: &ZnccPlan,
    y: usize,
    max_x: usize,
    min_var_i: f32,
) -> Option<Peak> {
    let tpl_width = plan.width;
    let tpl_height = plan.height;
    let n = (tpl_width * tpl_height) as f32;

    let mut best: Option<Peak> = None;
    for x in 0..=max_x {
        let mut dot = 0.0f32;
        let mut sum_i = 0.0f32;
        let mut sum_i2 = 0.0f32;

        for ty in 0..tpl_height {
            let img_row = image.row(y + ty).expect("row within bounds for scan");
            let base = ty * tpl_width;
            for tx in 0..tpl_width {
                let value = f32::from(img_row[x + tx]);
                dot += plan.t_prime[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= min_var_i {
            continue;
        }

        let score = dot / (plan.var_t * var_i).sqrt();
        if !score.is_finite() {
            continue;
        }
        match best {
            Some(current) if score <= current.score => {}
            _ => best = Some(Peak { x, y, score }),
        }
    }
    best
}
