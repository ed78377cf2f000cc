//! Smoothing and downscale filters for the matching pipeline.
//!
//! Both the captured template and every incoming frame pass through the same
//! treatment (blur on the frame side, area downscale on both) so the two
//! operands of the correlation share resolution and noise characteristics.

use crate::image::{ImageView, OwnedImage};
use crate::util::{TrackError, TrackResult};

/// Applies a separable 3x3 Gaussian smoothing pass.
///
/// Uses the binomial [1 2 1] kernel with replicated borders and a single
/// rounding step, which matches a 3x3 Gaussian with auto-derived sigma
/// closely enough to suppress sensor noise without visible ringing.
pub fn gaussian_blur_3x3(src: ImageView<'_, u8>) -> TrackResult<OwnedImage> {
    let width = src.width();
    let height = src.height();

    // Horizontal pass at 10-bit precision, vertical pass folds the /16.
    let mut tmp = vec![0u16; width * height];
    for y in 0..height {
        let row = src.row(y).ok_or(TrackError::BufferTooSmall {
            needed: y * src.stride() + width,
            got: src.as_slice().len(),
        })?;
        let out = &mut tmp[y * width..(y + 1) * width];
        for x in 0..width {
            let left = row[x.saturating_sub(1)];
            let mid = row[x];
            let right = row[(x + 1).min(width - 1)];
            out[x] = u16::from(left) + 2 * u16::from(mid) + u16::from(right);
        }
    }

    let mut data = vec![0u8; width * height];
    for y in 0..height {
        let up = y.saturating_sub(1) * width;
        let mid = y * width;
        let down = (y + 1).min(height - 1) * width;
        for x in 0..width {
            let sum =
                u32::from(tmp[up + x]) + 2 * u32::from(tmp[mid + x]) + u32::from(tmp[down + x]);
            data[mid + x] = ((sum + 8) / 16) as u8;
        }
    }

    OwnedImage::new(data, width, height)
}

/// Downscales by `scale` using area averaging.
///
/// Every destination pixel averages the source pixels its footprint covers,
/// weighting partially covered pixels by their overlap. Destination sides are
/// `round(side * scale)`; for `scale = 0.5` this reduces to a 2x2 box filter.
pub fn resize_area(src: ImageView<'_, u8>, scale: f32) -> TrackResult<OwnedImage> {
    if !(scale > 0.0 && scale <= 1.0) || !scale.is_finite() {
        return Err(TrackError::InvalidScale { scale });
    }

    let src_w = src.width();
    let src_h = src.height();
    let dst_w = ((src_w as f32) * scale).round() as usize;
    let dst_h = ((src_h as f32) * scale).round() as usize;
    if dst_w == 0 || dst_h == 0 {
        return Err(TrackError::InvalidDimensions {
            width: dst_w,
            height: dst_h,
        });
    }

    // Per-axis inverse factors; rounding of the destination size means the
    // effective factor can differ slightly from `1/scale` on each axis.
    let step_x = src_w as f64 / dst_w as f64;
    let step_y = src_h as f64 / dst_h as f64;

    let mut data = vec![0u8; dst_w * dst_h];
    for dy in 0..dst_h {
        let sy0 = dy as f64 * step_y;
        let sy1 = (sy0 + step_y).min(src_h as f64);
        let y_begin = sy0.floor() as usize;
        let y_end = (sy1.ceil() as usize).min(src_h);

        for dx in 0..dst_w {
            let sx0 = dx as f64 * step_x;
            let sx1 = (sx0 + step_x).min(src_w as f64);
            let x_begin = sx0.floor() as usize;
            let x_end = (sx1.ceil() as usize).min(src_w);

            let mut acc = 0.0f64;
            let mut area = 0.0f64;
            for sy in y_begin..y_end {
                let wy = overlap(sy, sy0, sy1);
                if wy <= 0.0 {
                    continue;
                }
                let row = src.row(sy).ok_or(TrackError::BufferTooSmall {
                    needed: sy * src.stride() + src_w,
                    got: src.as_slice().len(),
                })?;
                for sx in x_begin..x_end {
                    let wx = overlap(sx, sx0, sx1);
                    if wx <= 0.0 {
                        continue;
                    }
                    let w = wx * wy;
                    acc += w * f64::from(row[sx]);
                    area += w;
                }
            }
            data[dy * dst_w + dx] = (acc / area).round().clamp(0.0, 255.0) as u8;
        }
    }

    OwnedImage::new(data, dst_w, dst_h)
}

/// Overlap of source pixel `[i, i+1)` with the footprint `[lo, hi)`.
fn overlap(i: usize, lo: f64, hi: f64) -> f64 {
    let a = (i as f64).max(lo);
    let b = ((i + 1) as f64).min(hi);
    (b - a).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::{gaussian_blur_3x3, resize_area};
    use crate::image::ImageView;
    use crate::util::TrackError;

    #[test]
    fn blur_keeps_flat_regions_flat() {
        let data = vec![90u8; 25];
        let view = ImageView::from_slice(&data, 5, 5).unwrap();
        let out = gaussian_blur_3x3(view).unwrap();
        assert!(out.data().iter().all(|&v| v == 90));
    }

    #[test]
    fn blur_is_deterministic() {
        let data: Vec<u8> = (0u8..64).collect();
        let view = ImageView::from_slice(&data, 8, 8).unwrap();
        let a = gaussian_blur_3x3(view).unwrap();
        let b = gaussian_blur_3x3(view).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn half_scale_matches_box_filter() {
        let data = vec![
            10u8, 20, 30, 40, //
            50, 60, 70, 80, //
            90, 100, 110, 120, //
            130, 140, 150, 160,
        ];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let out = resize_area(view, 0.5).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 2);
        // Each output pixel is the mean of its 2x2 block.
        assert_eq!(out.data(), &[35, 55, 115, 135]);
    }

    #[test]
    fn odd_side_rounds_destination() {
        let data = vec![128u8; 7 * 7];
        let view = ImageView::from_slice(&data, 7, 7).unwrap();
        let out = resize_area(view, 0.5).unwrap();
        // round(7 * 0.5) = 4
        assert_eq!(out.width(), 4);
        assert_eq!(out.height(), 4);
        assert!(out.data().iter().all(|&v| v == 128));
    }

    #[test]
    fn rejects_bad_scale() {
        let data = vec![0u8; 4];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        assert!(matches!(
            resize_area(view, 0.0),
            Err(TrackError::InvalidScale { .. })
        ));
        assert!(matches!(
            resize_area(view, 1.5),
            Err(TrackError::InvalidScale { .. })
        ));
    }
}
