//! Redaction compositor
//!
//! Destructively blurs rectangular regions of an RGB image in place.
//!
//! # Methods
//!
//! - **Gaussian** ([`gaussian`]) - separable Gaussian smoothing, odd kernel size
//! - **Mosaic** ([`mosaic`]) - downscale then nearest-neighbour upscale
//!
//! Regions are clipped to the image before use; a region that is empty after
//! clipping is skipped without touching the buffer.
//!
//! # Example
//!
//! ```rust
//! use image::{Rgb, RgbImage};
//! use pii_redactor::{BlurOptions, Region, RegionBlur};
//!
//! let mut img = RgbImage::from_pixel(64, 64, Rgb([200, 10, 10]));
//! RegionBlur::apply(&mut img, Region::new(8, 8, 32, 16), &BlurOptions::mosaic(8));
//! ```

pub mod gaussian;
pub mod mosaic;
mod types;

use image::RgbImage;
use std::path::Path;
use tracing::debug;

pub use types::{
    BlurError, BlurMethod, BlurOptions, BlurOptionsBuilder, Point, Region, Result,
    DEFAULT_BLUR_STRENGTH,
};

/// Region blur entry points
pub struct RegionBlur;

impl RegionBlur {
    /// Blur one region in place according to `options`
    ///
    /// Returns `false` when the region was empty after clipping and nothing
    /// was written.
    pub fn apply(image: &mut RgbImage, region: Region, options: &BlurOptions) -> bool {
        let (width, height) = image.dimensions();
        let clipped = region.clip(width, height);
        if clipped.is_empty() {
            return false;
        }

        match options.method {
            BlurMethod::Gaussian => gaussian::blur_region(image, clipped, options.strength),
            BlurMethod::Mosaic => mosaic::pixelate_region(image, clipped, options.strength),
        }
        true
    }

    /// Blur every region in turn, returning how many were actually applied
    pub fn apply_all(image: &mut RgbImage, regions: &[Region], options: &BlurOptions) -> usize {
        let applied = regions
            .iter()
            .filter(|region| Self::apply(image, **region, options))
            .count();

        debug!(
            requested = regions.len(),
            applied,
            method = ?options.method,
            "blurred regions"
        );
        applied
    }

    /// Load an image file, blur the given regions and save the result
    pub fn process_file(
        input_path: &Path,
        output_path: &Path,
        regions: &[Region],
        options: &BlurOptions,
    ) -> Result<usize> {
        let mut rgb = load_rgb(input_path)?;
        let applied = Self::apply_all(&mut rgb, regions, options);

        rgb.save(output_path)
            .map_err(|e| BlurError::InvalidImage(e.to_string()))?;

        Ok(applied)
    }
}

/// Open an image file as 8-bit RGB
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(BlurError::ImageNotFound(path.to_path_buf()));
    }

    let img = image::open(path).map_err(|e| BlurError::InvalidImage(e.to_string()))?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checkerboard(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_apply_gaussian() {
        let mut image = checkerboard(20);
        let applied = RegionBlur::apply(&mut image, Region::new(5, 5, 10, 10), &BlurOptions::gaussian(5));
        assert!(applied);

        let center = image.get_pixel(10, 10).0[0];
        assert!(center > 50 && center < 205, "checkerboard should average out: {}", center);
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_apply_mosaic() {
        let mut image = checkerboard(20);
        RegionBlur::apply(&mut image, Region::new(0, 0, 20, 20), &BlurOptions::mosaic(10));
        assert_eq!(image.get_pixel(0, 0), image.get_pixel(9, 9));
    }

    #[test]
    fn test_apply_empty_region_is_byte_identical() {
        for options in [BlurOptions::gaussian(31), BlurOptions::mosaic(25)] {
            let mut image = checkerboard(16);
            let original = image.clone();

            assert!(!RegionBlur::apply(&mut image, Region::new(4, 4, 0, 0), &options));
            assert!(!RegionBlur::apply(&mut image, Region::new(40, 40, 5, 5), &options));

            assert_eq!(image.as_raw(), original.as_raw());
        }
    }

    #[test]
    fn test_apply_clips_to_bounds() {
        let mut image = checkerboard(10);
        let applied = RegionBlur::apply(&mut image, Region::new(6, 6, 50, 50), &BlurOptions::mosaic(4));
        assert!(applied);
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_apply_all_counts() {
        let mut image = checkerboard(20);
        let regions = [
            Region::new(0, 0, 5, 5),
            Region::new(30, 30, 5, 5),
            Region::new(10, 10, 5, 5),
        ];
        let applied = RegionBlur::apply_all(&mut image, &regions, &BlurOptions::default());
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_image_not_found() {
        let result = load_rgb(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BlurError::ImageNotFound(_))));
    }

    #[test]
    fn test_process_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        checkerboard(12).save(&input).unwrap();

        let applied = RegionBlur::process_file(
            &input,
            &output,
            &[Region::new(0, 0, 6, 6)],
            &BlurOptions::mosaic(3),
        )
        .unwrap();

        assert_eq!(applied, 1);
        assert!(output.exists());
    }
}
