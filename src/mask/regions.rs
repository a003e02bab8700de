//! Mask to region decomposition

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

use super::types::MIN_NEIGHBORHOOD_SIDE;
use crate::blur::Region;

/// Bounding rectangle of a contour, inclusive of its extreme points
fn bounding_rect(contour: &Contour<i32>) -> Option<Region> {
    let first = contour.points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);

    for point in &contour.points[1..] {
        min_x = min_x.min(point.x);
        max_x = max_x.max(point.x);
        min_y = min_y.min(point.y);
        max_y = max_y.max(point.y);
    }

    Some(Region::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// One bounding rectangle per external (outermost) contour of the mask
///
/// Holes and blobs nested inside holes are ignored; their area is already
/// covered by the enclosing rectangle.
pub fn regions_from_mask(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(bounding_rect)
        .collect()
}

/// One `size x size` square centred on every foreground pixel, clipped to the
/// mask bounds
///
/// Squares narrower or shorter than 3 pixels after clipping are dropped.
/// Order is row-major over the mask.
pub fn pixel_neighborhoods(mask: &GrayImage, size: u32) -> Vec<Region> {
    let (width, height) = mask.dimensions();
    let radius = (size.saturating_sub(1) / 2) as i64;

    mask.enumerate_pixels()
        .filter(|(_, _, px)| px.0[0] > 0)
        .map(|(x, y, _)| {
            let (x, y) = (x as i64, y as i64);
            Region::from_bounds(
                x - radius,
                y - radius,
                x + radius + 1,
                y + radius + 1,
                width,
                height,
            )
        })
        .filter(|r| r.width >= MIN_NEIGHBORHOOD_SIDE && r.height >= MIN_NEIGHBORHOOD_SIDE)
        .collect()
}
