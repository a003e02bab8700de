//! Mosaic (pixelation) region blur

use image::imageops::{self, FilterType};
use image::RgbImage;

use super::types::{Region, MIN_MOSAIC_BLOCK};

/// Pixelate `region` of `image` in place
///
/// The region is shrunk to `max(1, dim / block)` with bilinear filtering and
/// blown back up with nearest-neighbour sampling. Empty regions are ignored.
pub fn pixelate_region(image: &mut RgbImage, region: Region, block_size: u32) {
    if region.is_empty() {
        return;
    }

    let block = block_size.max(MIN_MOSAIC_BLOCK);
    let (w, h) = (region.width, region.height);
    let small_w = (w / block).max(1);
    let small_h = (h / block).max(1);

    let roi = imageops::crop_imm(image, region.x, region.y, w, h).to_image();
    let small = imageops::resize(&roi, small_w, small_h, FilterType::Triangle);
    let pixelated = imageops::resize(&small, w, h, FilterType::Nearest);

    imageops::replace(image, &pixelated, region.x as i64, region.y as i64);
}
