//! Occlusion saliency search
//!
//! Probes a black-box [`Scorer`] by hiding one window of the image at a time
//! and measuring how much the score drops. The result is a dense
//! [`SaliencyMap`](crate::mask::SaliencyMap) at image resolution that the
//! mask engine can threshold.
//!
//! # Example
//!
//! ```rust
//! use image::RgbImage;
//! use pii_redactor::{OcclusionOptions, OcclusionSearch, SaliencyError, SilentProgress};
//!
//! fn brightness(img: &RgbImage) -> Result<f32, SaliencyError> {
//!     Ok(img.as_raw().iter().map(|&v| v as f32).sum::<f32>())
//! }
//!
//! let img = RgbImage::new(32, 32);
//! let map = OcclusionSearch::saliency(&img, &brightness, &OcclusionOptions::default(), &SilentProgress)
//!     .unwrap();
//! assert_eq!(map.dimensions(), (32, 32));
//! ```

mod occlusion;
mod types;

pub use occlusion::OcclusionSearch;
pub use types::{
    FillStrategy, OcclusionOptions, OcclusionOptionsBuilder, Result, SaliencyError, Scorer,
    DEFAULT_STRIDE, DEFAULT_WINDOW, GRAY_FILL,
};
