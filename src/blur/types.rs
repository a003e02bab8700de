//! Common types for the blur module

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Default blur strength (Gaussian kernel size / mosaic block size)
pub const DEFAULT_BLUR_STRENGTH: u32 = 31;

/// Smallest mosaic block that still pixelates
pub const MIN_MOSAIC_BLOCK: u32 = 2;

// ============================================================
// Error Types
// ============================================================

/// Blur error types
#[derive(Debug, Error)]
pub enum BlurError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BlurError>;

// ============================================================
// Geometry
// ============================================================

/// Integer pixel coordinate, may lie outside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle
///
/// Regions handed to the compositor are expected to be clipped to the image;
/// every constructor that takes image dimensions clips for you.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a region from signed half-open bounds `[x0, x1) x [y0, y1)`,
    /// intersected with an image of the given size
    pub fn from_bounds(x0: i64, y0: i64, x1: i64, y1: i64, width: u32, height: u32) -> Self {
        let cx0 = x0.clamp(0, width as i64);
        let cy0 = y0.clamp(0, height as i64);
        let cx1 = x1.clamp(0, width as i64);
        let cy1 = y1.clamp(0, height as i64);

        Self {
            x: cx0 as u32,
            y: cy0 as u32,
            width: (cx1 - cx0).max(0) as u32,
            height: (cy1 - cy0).max(0) as u32,
        }
    }

    /// Axis-aligned bounding box of a polygon (e.g. an OCR quadrilateral),
    /// clipped to the image
    pub fn from_polygon(points: &[Point], width: u32, height: u32) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let min_x = points.iter().map(|p| p.x).min().unwrap_or(0) as i64;
        let max_x = points.iter().map(|p| p.x).max().unwrap_or(0) as i64;
        let min_y = points.iter().map(|p| p.y).min().unwrap_or(0) as i64;
        let max_y = points.iter().map(|p| p.y).max().unwrap_or(0) as i64;

        Self::from_bounds(min_x, min_y, max_x, max_y, width, height)
    }

    /// Intersect with an image of the given size
    #[must_use]
    pub fn clip(&self, width: u32, height: u32) -> Self {
        Self::from_bounds(
            self.x as i64,
            self.y as i64,
            self.right() as i64,
            self.bottom() as i64,
            width,
            height,
        )
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl FromStr for Region {
    type Err = BlurError;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BlurError::InvalidRegion(format!(
                "expected x,y,width,height but got '{}'",
                s
            )));
        }

        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                BlurError::InvalidRegion(format!("'{}' is not a non-negative integer", part))
            })?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

// ============================================================
// Options
// ============================================================

/// Blur method selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurMethod {
    /// Gaussian smoothing
    #[default]
    Gaussian,

    /// Block pixelation (downscale, then nearest-neighbour upscale)
    Mosaic,
}

impl FromStr for BlurMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(BlurMethod::Gaussian),
            "mosaic" => Ok(BlurMethod::Mosaic),
            other => Err(format!("unknown blur method '{}'", other)),
        }
    }
}

/// Options for region blurring
#[derive(Debug, Clone, PartialEq)]
pub struct BlurOptions {
    /// Blur method
    pub method: BlurMethod,

    /// Kernel size for Gaussian, block size for mosaic
    pub strength: u32,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self {
            method: BlurMethod::Gaussian,
            strength: DEFAULT_BLUR_STRENGTH,
        }
    }
}

impl BlurOptions {
    /// Create a builder
    pub fn builder() -> BlurOptionsBuilder {
        BlurOptionsBuilder::default()
    }

    /// Gaussian blur with the given kernel size
    pub fn gaussian(ksize: u32) -> Self {
        Self {
            method: BlurMethod::Gaussian,
            strength: ksize,
        }
    }

    /// Mosaic with the given block size
    pub fn mosaic(block_size: u32) -> Self {
        Self {
            method: BlurMethod::Mosaic,
            strength: block_size,
        }
    }
}

/// Builder for BlurOptions
#[derive(Debug, Default)]
pub struct BlurOptionsBuilder {
    options: BlurOptions,
}

impl BlurOptionsBuilder {
    /// Set blur method
    #[must_use]
    pub fn method(mut self, method: BlurMethod) -> Self {
        self.options.method = method;
        self
    }

    /// Set blur strength
    #[must_use]
    pub fn strength(mut self, strength: u32) -> Self {
        self.options.strength = strength.max(1);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> BlurOptions {
        self.options
    }
}
