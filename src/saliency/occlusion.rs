//! Occlusion grid search
//!
//! # Algorithm
//!
//! 1. Score the untouched image (baseline)
//! 2. For each grid cell, occlude a `window x window` square at the cell
//!    origin on a copy of the image and score it again
//! 3. Cell value is the score drop, floored at zero
//! 4. Normalize by the grid maximum and upsample to image size (Catmull-Rom)

use image::imageops::{self, FilterType};
use image::{Luma, Rgb, RgbImage};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use super::types::{
    FillStrategy, OcclusionOptions, Result, SaliencyError, Scorer, GRAY_FILL, NORMALIZE_EPSILON,
};
use crate::blur::{gaussian, Region};
use crate::mask::{HeatMap, SaliencyMap};
use crate::progress::ProgressCallback;

/// Occlusion saliency search
pub struct OcclusionSearch;

impl OcclusionSearch {
    /// Compute a saliency map for `image` under `scorer`
    ///
    /// Cells are scored independently; with `options.parallel` they are
    /// spread over the rayon pool and each grid value is still written once.
    /// The first scorer failure aborts the search.
    pub fn saliency<S>(
        image: &RgbImage,
        scorer: &S,
        options: &OcclusionOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<SaliencyMap>
    where
        S: Scorer + ?Sized,
    {
        options.validate()?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SaliencyError::EmptyImage);
        }

        let baseline = scorer.score(image)?;
        let (grid_w, grid_h) = options.grid_size(width, height);
        let total = (grid_w * grid_h) as usize;
        let done = AtomicUsize::new(0);

        progress.on_step_start("occlusion search");

        let score_cell = |index: usize| -> Result<f32> {
            let gx = index as u32 % grid_w;
            let gy = index as u32 / grid_w;
            let region = Self::cell_region(gx, gy, options, width, height);

            let occluded = Self::occlude(image, region, options);
            let score = scorer.score(&occluded)?;

            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_step_progress(current, total);

            Ok((baseline - score).max(0.0))
        };

        let values: Vec<f32> = if options.parallel {
            (0..total)
                .into_par_iter()
                .map(score_cell)
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..total).map(score_cell).collect::<Result<Vec<_>>>()?
        };

        let mut grid = HeatMap::from_fn(grid_w, grid_h, |gx, gy| {
            Luma([values[(gy * grid_w + gx) as usize]])
        });

        let peak = grid.pixels().fold(0.0f32, |acc, px| acc.max(px.0[0]));
        if peak > NORMALIZE_EPSILON {
            for px in grid.pixels_mut() {
                px.0[0] /= peak;
            }
        }

        let mut heat = imageops::resize(&grid, width, height, FilterType::CatmullRom);
        for px in heat.pixels_mut() {
            px.0[0] = px.0[0].max(0.0);
        }

        debug!(
            width,
            height,
            grid_w,
            grid_h,
            baseline,
            peak,
            "occlusion search finished"
        );
        progress.on_step_complete("occlusion search", &format!("{} cells", total));

        Ok(SaliencyMap::new(heat))
    }

    /// Clipped occlusion window for grid cell `(gx, gy)`
    pub fn cell_region(
        gx: u32,
        gy: u32,
        options: &OcclusionOptions,
        width: u32,
        height: u32,
    ) -> Region {
        let x0 = (gx * options.stride) as i64;
        let y0 = (gy * options.stride) as i64;
        let side = options.window as i64;
        Region::from_bounds(x0, y0, x0 + side, y0 + side, width, height)
    }

    /// Copy of `image` with `region` filled according to the options
    pub fn occlude(image: &RgbImage, region: Region, options: &OcclusionOptions) -> RgbImage {
        let mut out = image.clone();
        if region.is_empty() {
            return out;
        }

        match options.fill {
            FillStrategy::Blur => {
                gaussian::blur_region(&mut out, region, options.fill_kernel());
            }
            FillStrategy::Gray => {
                fill_region(&mut out, region, Rgb([GRAY_FILL; 3]));
            }
            FillStrategy::Mean => {
                let mean = region_mean(image, region);
                fill_region(&mut out, region, mean);
            }
        }
        out
    }
}

fn fill_region(image: &mut RgbImage, region: Region, color: Rgb<u8>) {
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            image.put_pixel(x, y, color);
        }
    }
}

/// Per-channel mean of a region, truncated to u8
fn region_mean(image: &RgbImage, region: Region) -> Rgb<u8> {
    let mut sums = [0u64; 3];
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let px = image.get_pixel(x, y);
            for (sum, &v) in sums.iter_mut().zip(px.0.iter()) {
                *sum += v as u64;
            }
        }
    }

    let count = region.area().max(1);
    Rgb([
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ])
}
