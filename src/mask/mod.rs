//! Saliency-to-mask engine
//!
//! Turns a continuous saliency heatmap into a binary mask and then into
//! rectangles the compositor can blur.
//!
//! # Modes
//!
//! - **Regions** - one bounding rectangle per external contour (coarse)
//! - **Pixels** - one small square per masked pixel (fine, many more blurs)
//!
//! Pixel mode re-blurs overlapping neighbourhoods, so a Gaussian blur is
//! applied several times to the same pixels and over-smooths compared to a
//! single blur of the union. That trade-off is kept on purpose.
//!
//! # Example
//!
//! ```rust
//! use pii_redactor::{MaskEngine, MaskOptions, SaliencyMap};
//!
//! let map = SaliencyMap::from_fn(64, 64, |x, y| if x > 40 && y > 40 { 1.0 } else { 0.0 });
//! let options = MaskOptions::builder().top_fraction(0.1).build();
//! let result = MaskEngine::extract(&map, &options).unwrap();
//! assert_eq!(result.regions.len(), 1);
//! ```

pub mod regions;
pub mod threshold;
mod types;

use tracing::debug;

pub use types::{
    HeatMap, MaskError, MaskMode, MaskOptions, MaskOptionsBuilder, MaskResult, Result,
    SaliencyMap, DEFAULT_DILATE, DEFAULT_NEIGHBORHOOD, DEFAULT_TOP_FRACTION, MASK_ON,
};

/// Mask extraction entry points
pub struct MaskEngine;

impl MaskEngine {
    /// Threshold (and optionally dilate) a saliency map into a binary mask
    pub fn build_mask(map: &SaliencyMap, options: &MaskOptions) -> Result<image::GrayImage> {
        options.validate()?;
        let mask = threshold::threshold_top_fraction(map, options.top_fraction)?;
        Ok(threshold::dilate_mask(&mask, options.dilate))
    }

    /// Full extraction: mask, regions for the configured mode, coverage
    ///
    /// An empty mask is a legitimate outcome and yields no regions.
    pub fn extract(map: &SaliencyMap, options: &MaskOptions) -> Result<MaskResult> {
        let mask = Self::build_mask(map, options)?;

        let regions = match options.mode {
            MaskMode::Regions => regions::regions_from_mask(&mask),
            MaskMode::Pixels { size } => regions::pixel_neighborhoods(&mask, size),
        };
        let coverage = threshold::coverage(&mask);

        debug!(
            mode = ?options.mode,
            top_fraction = options.top_fraction,
            dilate = options.dilate,
            regions = regions.len(),
            coverage,
            "extracted mask regions"
        );

        Ok(MaskResult {
            mask,
            regions,
            coverage,
        })
    }
}
