//! Quantile thresholding and dilation
//!
//! # Algorithm
//!
//! 1. Min-max normalize the saliency map
//! 2. Threshold at the `(1 - p)` quantile, keeping the hottest `p` fraction
//! 3. Optionally dilate with a disc-shaped structuring element

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::types::{MaskError, Result, SaliencyMap, MASK_ON};

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics
///
/// Returns `None` for an empty slice. NaN values are ordered last.
pub fn quantile(values: &[f32], q: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0) as f64;
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = (pos - lower as f64) as f32;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Threshold a saliency map so that roughly the top `top_fraction` of its
/// pixels are foreground
///
/// A flat map (no variation at all, including all zeros) carries no signal
/// and produces an empty mask whatever the fraction.
pub fn threshold_top_fraction(map: &SaliencyMap, top_fraction: f32) -> Result<GrayImage> {
    if !(top_fraction > 0.0 && top_fraction <= 1.0) {
        return Err(MaskError::InvalidTopFraction(top_fraction));
    }

    let (width, height) = map.dimensions();
    if width == 0 || height == 0 {
        return Err(MaskError::EmptyMap);
    }

    let mut mask = GrayImage::new(width, height);
    if map.is_flat() {
        return Ok(mask);
    }

    let normalized = map.normalized();
    let Some(threshold) = quantile(normalized.values(), 1.0 - top_fraction) else {
        return Ok(mask);
    };

    for (x, y, px) in mask.enumerate_pixels_mut() {
        if normalized.get(x, y) >= threshold {
            *px = Luma([MASK_ON]);
        }
    }

    Ok(mask)
}

/// Grow the mask with an elliptical (disc) structuring element of side `size`
///
/// Sizes of 0 or 1 leave the mask unchanged.
pub fn dilate_mask(mask: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return mask.clone();
    }

    let radius = (size / 2).min(u8::MAX as u32) as u8;
    if radius == 0 {
        return mask.clone();
    }
    morphology::dilate(mask, Norm::L2, radius)
}

/// Fraction of foreground pixels
pub fn coverage(mask: &GrayImage) -> f32 {
    let total = mask.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let on = mask.as_raw().iter().filter(|&&v| v > 0).count();
    on as f32 / total as f32
}

/// Number of foreground pixels
pub fn count_on(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v > 0).count()
}
