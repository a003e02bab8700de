//! Core types for occlusion saliency search

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Default occlusion window side in pixels
pub const DEFAULT_WINDOW: u32 = 64;

/// Default grid stride in pixels
pub const DEFAULT_STRIDE: u32 = 32;

/// Flat gray fill value
pub const GRAY_FILL: u8 = 127;

/// Smallest Gaussian kernel used by the blur fill
pub const MIN_FILL_KERNEL: u32 = 3;

/// Grid maxima at or below this are left unnormalized
pub const NORMALIZE_EPSILON: f32 = 1e-9;

// ============================================================
// Error Types
// ============================================================

/// Saliency search error types
#[derive(Debug, Error)]
pub enum SaliencyError {
    #[error("Occlusion window must be positive")]
    InvalidWindow,

    #[error("Grid stride must be positive")]
    InvalidStride,

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Scorer failed: {0}")]
    ScorerFailed(String),
}

pub type Result<T> = std::result::Result<T, SaliencyError>;

// ============================================================
// Scorer
// ============================================================

/// Black-box image scorer probed by the occlusion search
///
/// Must be deterministic for the heatmap to be meaningful. Implementations
/// are shared across worker threads when parallel scoring is enabled.
pub trait Scorer: Sync {
    fn score(&self, image: &RgbImage) -> Result<f32>;
}

impl<F> Scorer for F
where
    F: Fn(&RgbImage) -> Result<f32> + Sync,
{
    fn score(&self, image: &RgbImage) -> Result<f32> {
        self(image)
    }
}

// ============================================================
// Options
// ============================================================

/// How an occluded window is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Gaussian blur of the window's own content
    #[default]
    Blur,
    /// Flat mid-gray
    Gray,
    /// Per-channel mean of the window
    Mean,
}

impl FromStr for FillStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blur" => Ok(FillStrategy::Blur),
            "gray" | "grey" => Ok(FillStrategy::Gray),
            "mean" => Ok(FillStrategy::Mean),
            other => Err(format!("unknown fill strategy '{}'", other)),
        }
    }
}

/// Options for occlusion saliency search
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionOptions {
    /// Side of the square occlusion window
    pub window: u32,

    /// Step between window origins
    pub stride: u32,

    /// Window fill strategy
    pub fill: FillStrategy,

    /// Score grid cells on the rayon pool
    pub parallel: bool,
}

impl Default for OcclusionOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            stride: DEFAULT_STRIDE,
            fill: FillStrategy::Blur,
            parallel: false,
        }
    }
}

impl OcclusionOptions {
    pub fn builder() -> OcclusionOptionsBuilder {
        OcclusionOptionsBuilder::default()
    }

    /// Fine grid preset: half-size window, quarter stride
    pub fn fine() -> Self {
        Self {
            window: DEFAULT_WINDOW / 2,
            stride: DEFAULT_STRIDE / 4,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(SaliencyError::InvalidWindow);
        }
        if self.stride == 0 {
            return Err(SaliencyError::InvalidStride);
        }
        Ok(())
    }

    /// Gaussian kernel size used by [`FillStrategy::Blur`]
    pub fn fill_kernel(&self) -> u32 {
        MIN_FILL_KERNEL.max((self.window / 5) * 2 + 1)
    }

    /// Grid dimensions `(columns, rows)` for an image of the given size
    pub fn grid_size(&self, width: u32, height: u32) -> (u32, u32) {
        let stride = self.stride.max(1);
        (
            (width.saturating_sub(1) / stride + 1),
            (height.saturating_sub(1) / stride + 1),
        )
    }
}

/// Builder for OcclusionOptions
#[derive(Debug, Default)]
pub struct OcclusionOptionsBuilder {
    options: OcclusionOptions,
}

impl OcclusionOptionsBuilder {
    #[must_use]
    pub fn window(mut self, window: u32) -> Self {
        self.options.window = window;
        self
    }

    #[must_use]
    pub fn stride(mut self, stride: u32) -> Self {
        self.options.stride = stride;
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: FillStrategy) -> Self {
        self.options.fill = fill;
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    #[must_use]
    pub fn build(self) -> OcclusionOptions {
        self.options
    }
}
