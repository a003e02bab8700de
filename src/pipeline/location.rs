//! Location redaction
//!
//! # Algorithm
//!
//! 1. Rank classifier labels by probability and keep the top `k`
//! 2. Run an occlusion search per kept label, scoring that label's probability
//! 3. Combine the per-label maps with a pixelwise maximum
//! 4. Threshold, dilate and extract regions with the mask engine
//! 5. Blur every region (mosaic by default)

use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::types::{
    LocationClassifier, PipelineError, Result, DEFAULT_LOCATION_BLUR_STRENGTH, DEFAULT_TOP_K,
};
use crate::blur::{self, BlurError, BlurOptions, Region, RegionBlur};
use crate::mask::{MaskEngine, MaskError, MaskOptions, MaskResult, SaliencyMap};
use crate::progress::ProgressCallback;
use crate::saliency::{self, OcclusionOptions, OcclusionSearch, SaliencyError, Scorer};

/// Scores one classifier label's probability
pub struct LabelScorer<'a> {
    classifier: &'a dyn LocationClassifier,
    index: usize,
}

impl<'a> LabelScorer<'a> {
    pub fn new(classifier: &'a dyn LocationClassifier, index: usize) -> Self {
        Self { classifier, index }
    }
}

impl Scorer for LabelScorer<'_> {
    fn score(&self, image: &RgbImage) -> saliency::Result<f32> {
        let probabilities = self.classifier.probabilities(image)?;
        probabilities.get(self.index).copied().ok_or_else(|| {
            SaliencyError::ScorerFailed(format!(
                "label index {} out of range for {} probabilities",
                self.index,
                probabilities.len()
            ))
        })
    }
}

/// Options for location redaction
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPipelineOptions {
    /// Number of top labels to explain (at least one is always used)
    pub top_k: usize,

    pub occlusion: OcclusionOptions,

    pub mask: MaskOptions,

    pub blur: BlurOptions,
}

impl Default for LocationPipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            occlusion: OcclusionOptions::default(),
            mask: MaskOptions::default(),
            blur: BlurOptions::mosaic(DEFAULT_LOCATION_BLUR_STRENGTH),
        }
    }
}

impl LocationPipelineOptions {
    pub fn builder() -> LocationPipelineOptionsBuilder {
        LocationPipelineOptionsBuilder::default()
    }
}

/// Builder for LocationPipelineOptions
#[derive(Debug, Default)]
pub struct LocationPipelineOptionsBuilder {
    options: LocationPipelineOptions,
}

impl LocationPipelineOptionsBuilder {
    #[must_use]
    pub fn top_k(mut self, k: usize) -> Self {
        self.options.top_k = k;
        self
    }

    #[must_use]
    pub fn occlusion(mut self, occlusion: OcclusionOptions) -> Self {
        self.options.occlusion = occlusion;
        self
    }

    #[must_use]
    pub fn mask(mut self, mask: MaskOptions) -> Self {
        self.options.mask = mask;
        self
    }

    #[must_use]
    pub fn blur(mut self, blur: BlurOptions) -> Self {
        self.options.blur = blur;
        self
    }

    #[must_use]
    pub fn build(self) -> LocationPipelineOptions {
        self.options
    }
}

/// Outcome of location redaction on one image
#[derive(Debug, Clone, Serialize)]
pub struct LocationRedactionReport {
    /// Explained labels, most probable first
    pub top_labels: Vec<String>,
    pub top_scores: Vec<f32>,
    pub num_regions: usize,
    /// Fraction of mask pixels marked for redaction
    pub mask_coverage: f32,
    pub regions: Vec<Region>,
}

/// Saliency-driven redaction over a caller-owned classifier
pub struct LocationRedactionPipeline<'a> {
    classifier: &'a dyn LocationClassifier,
    options: LocationPipelineOptions,
}

impl<'a> LocationRedactionPipeline<'a> {
    pub fn new(classifier: &'a dyn LocationClassifier, options: LocationPipelineOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    pub fn options(&self) -> &LocationPipelineOptions {
        &self.options
    }

    /// Indices of the `k` most probable labels, highest first
    ///
    /// Ties keep label order. `k` is raised to one.
    pub fn top_labels(probabilities: &[f32], k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..probabilities.len()).collect();
        order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
        order.truncate(k.max(1));
        order
    }

    /// Redact `image` in place
    pub fn redact(
        &self,
        image: &mut RgbImage,
        progress: &dyn ProgressCallback,
    ) -> Result<LocationRedactionReport> {
        let labels = self.classifier.labels();
        if labels.is_empty() {
            return Err(PipelineError::NoLabels);
        }

        let probabilities = self.classifier.probabilities(image)?;
        if probabilities.len() != labels.len() {
            return Err(PipelineError::ClassifierMismatch {
                labels: labels.len(),
                probabilities: probabilities.len(),
            });
        }

        let top = Self::top_labels(&probabilities, self.options.top_k);
        let (width, height) = image.dimensions();
        let mut heat = SaliencyMap::zeros(width, height);

        for &index in &top {
            progress.on_debug(&format!(
                "explaining '{}' (p={:.3})",
                labels[index], probabilities[index]
            ));
            let scorer = LabelScorer::new(self.classifier, index);
            let map = OcclusionSearch::saliency(image, &scorer, &self.options.occlusion, progress)?;
            heat.union_max(&map)?;
        }

        let result = Self::apply_heat(image, &heat, &self.options.mask, &self.options.blur)?;

        Ok(LocationRedactionReport {
            top_labels: top.iter().map(|&i| labels[i].clone()).collect(),
            top_scores: top.iter().map(|&i| probabilities[i]).collect(),
            num_regions: result.regions.len(),
            mask_coverage: result.coverage,
            regions: result.regions,
        })
    }

    /// Mask a precomputed heatmap and blur the resulting regions
    ///
    /// The heatmap must match the image size.
    pub fn apply_heat(
        image: &mut RgbImage,
        heat: &SaliencyMap,
        mask: &MaskOptions,
        blur: &BlurOptions,
    ) -> Result<MaskResult> {
        if heat.dimensions() != image.dimensions() {
            return Err(MaskError::DimensionMismatch {
                expected: image.dimensions(),
                actual: heat.dimensions(),
            }
            .into());
        }

        let result = MaskEngine::extract(heat, mask)?;
        let applied = RegionBlur::apply_all(image, &result.regions, blur);
        debug!(
            regions = result.regions.len(),
            applied,
            coverage = result.coverage,
            "applied heatmap mask"
        );
        Ok(result)
    }

    /// Load, redact and save one image file
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<LocationRedactionReport> {
        let mut image = blur::load_rgb(input)?;
        let report = self.redact(&mut image, progress)?;
        image
            .save(output)
            .map_err(|e| BlurError::InvalidImage(e.to_string()))?;

        info!(
            input = %input.display(),
            labels = ?report.top_labels,
            regions = report.num_regions,
            "redacted location cues"
        );
        Ok(report)
    }
}
