//! Core types for the mask engine

use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::blur::Region;

// ============================================================
// Constants
// ============================================================

/// Default fraction of the map kept as "hot"
pub const DEFAULT_TOP_FRACTION: f32 = 0.2;

/// Default elliptical dilation kernel size
pub const DEFAULT_DILATE: u32 = 9;

/// Default pixel-neighbourhood side length
pub const DEFAULT_NEIGHBORHOOD: u32 = 11;

/// Smallest neighbourhood side worth blurring after clipping
pub const MIN_NEIGHBORHOOD_SIDE: u32 = 3;

/// Value ranges at or below this are treated as a flat map
pub const FLAT_EPSILON: f32 = 1e-9;

/// Foreground value in binary masks
pub const MASK_ON: u8 = 255;

// ============================================================
// Error Types
// ============================================================

/// Mask engine error types
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("Top fraction must be in (0, 1], got {0}")]
    InvalidTopFraction(f32),

    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Empty saliency map")]
    EmptyMap,
}

pub type Result<T> = std::result::Result<T, MaskError>;

// ============================================================
// Saliency Map
// ============================================================

/// Single-channel floating point heatmap
pub type HeatMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Dense per-pixel saliency at image resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyMap {
    heat: HeatMap,
}

impl SaliencyMap {
    pub fn new(heat: HeatMap) -> Self {
        Self { heat }
    }

    /// All-zero map
    pub fn zeros(width: u32, height: u32) -> Self {
        Self::new(HeatMap::new(width, height))
    }

    /// Build from a function of pixel position
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> f32,
    {
        Self::new(HeatMap::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    /// Interpret an 8-bit grayscale image as saliency in `[0, 1]`
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self::from_fn(gray.width(), gray.height(), |x, y| {
            gray.get_pixel(x, y).0[0] as f32 / 255.0
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.heat.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.heat.width()
    }

    pub fn height(&self) -> u32 {
        self.heat.height()
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.heat.get_pixel(x, y).0[0]
    }

    /// Raw row-major values
    pub fn values(&self) -> &[f32] {
        self.heat.as_raw()
    }

    pub fn heat(&self) -> &HeatMap {
        &self.heat
    }

    pub fn into_heat(self) -> HeatMap {
        self.heat
    }

    /// Minimum and maximum value, `None` for an empty map
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let values = self.values();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
    }

    /// Whether the map carries no usable signal (empty or constant)
    pub fn is_flat(&self) -> bool {
        match self.min_max() {
            Some((lo, hi)) => hi - lo <= FLAT_EPSILON,
            None => true,
        }
    }

    /// Min-max normalized copy in `[0, 1]`
    #[must_use]
    pub fn normalized(&self) -> Self {
        let Some((lo, hi)) = self.min_max() else {
            return self.clone();
        };
        let range = hi - lo + FLAT_EPSILON;
        let mut heat = self.heat.clone();
        for px in heat.pixels_mut() {
            px.0[0] = (px.0[0] - lo) / range;
        }
        Self::new(heat)
    }

    /// Element-wise maximum with another map of the same size
    pub fn union_max(&mut self, other: &SaliencyMap) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(MaskError::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        for (dst, src) in self.heat.pixels_mut().zip(other.heat.pixels()) {
            dst.0[0] = dst.0[0].max(src.0[0]);
        }
        Ok(())
    }
}

// ============================================================
// Options
// ============================================================

/// How a binary mask is turned into blur regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum MaskMode {
    /// One bounding rectangle per external contour
    #[default]
    Regions,

    /// One `size x size` square per masked pixel
    Pixels { size: u32 },
}

impl FromStr for MaskMode {
    type Err = String;

    /// Parse `regions`, `pixels` or `pixels:<size>`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.split_once(':') {
            None if lower == "regions" => Ok(MaskMode::Regions),
            None if lower == "pixels" => Ok(MaskMode::Pixels {
                size: DEFAULT_NEIGHBORHOOD,
            }),
            Some(("pixels", size)) => size
                .parse()
                .map(|size| MaskMode::Pixels { size })
                .map_err(|_| format!("invalid neighbourhood size '{}'", size)),
            _ => Err(format!("unknown mask mode '{}'", s)),
        }
    }
}

/// Options for turning a saliency map into a mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOptions {
    /// Fraction of the map (by quantile) marked as foreground, in (0, 1]
    pub top_fraction: f32,

    /// Elliptical dilation kernel size, applied when greater than 1
    pub dilate: u32,

    /// Consumption mode
    pub mode: MaskMode,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            top_fraction: DEFAULT_TOP_FRACTION,
            dilate: DEFAULT_DILATE,
            mode: MaskMode::Regions,
        }
    }
}

impl MaskOptions {
    /// Create a builder
    pub fn builder() -> MaskOptionsBuilder {
        MaskOptionsBuilder::default()
    }

    /// Reject values the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if !(self.top_fraction > 0.0 && self.top_fraction <= 1.0) {
            return Err(MaskError::InvalidTopFraction(self.top_fraction));
        }
        Ok(())
    }
}

/// Builder for MaskOptions
#[derive(Debug, Default)]
pub struct MaskOptionsBuilder {
    options: MaskOptions,
}

impl MaskOptionsBuilder {
    /// Set top fraction
    #[must_use]
    pub fn top_fraction(mut self, p: f32) -> Self {
        self.options.top_fraction = p;
        self
    }

    /// Set dilation kernel size (0 or 1 disables dilation)
    #[must_use]
    pub fn dilate(mut self, size: u32) -> Self {
        self.options.dilate = size;
        self
    }

    /// Set consumption mode
    #[must_use]
    pub fn mode(mut self, mode: MaskMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> MaskOptions {
        self.options
    }
}

// ============================================================
// Result
// ============================================================

/// Outcome of mask extraction
#[derive(Debug, Clone)]
pub struct MaskResult {
    /// Binary mask (0 / 255) at map resolution
    pub mask: GrayImage,

    /// Regions to blur, in extraction order
    pub regions: Vec<Region>,

    /// Fraction of foreground pixels
    pub coverage: f32,
}

impl MaskResult {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
