//! Core types for the image redaction pipelines

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::blur::{BlurError, Point, Region};
use crate::mask::MaskError;
use crate::saliency::{self, SaliencyError};
use crate::text::{LabelSet, SpanDetector, TextError};

// ============================================================
// Constants
// ============================================================

/// Default minimum OCR confidence for a box to be considered
pub const DEFAULT_MIN_OCR_CONFIDENCE: f32 = 0.3;

/// Default minimum detector score for a PII tag to be blurred
pub const DEFAULT_MIN_PII_SCORE: f32 = 0.35;

/// Default number of classifier labels explained per image
pub const DEFAULT_TOP_K: usize = 1;

/// Default mosaic block size for location redaction
pub const DEFAULT_LOCATION_BLUR_STRENGTH: u32 = 75;

// ============================================================
// Error Types
// ============================================================

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("PII tag references box {index} but only {len} boxes exist")]
    BoxIndexOutOfRange { index: usize, len: usize },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Classifier returned {probabilities} probabilities for {labels} labels")]
    ClassifierMismatch { labels: usize, probabilities: usize },

    #[error("Classifier has no labels")]
    NoLabels,

    #[error(transparent)]
    Blur(#[from] BlurError),

    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Saliency(#[from] SaliencyError),

    #[error(transparent)]
    Text(#[from] TextError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// OCR Data
// ============================================================

/// One recognized text box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrBox {
    pub text: String,
    /// Quadrilateral corners in image coordinates
    pub polygon: [Point; 4],
    /// Recognition confidence, `None` when the engine reports none
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl OcrBox {
    pub fn new(text: impl Into<String>, polygon: [Point; 4], confidence: f32) -> Self {
        Self {
            text: text.into(),
            polygon,
            confidence: Some(confidence),
        }
    }

    /// Axis-aligned box from `(x, y, width, height)`
    pub fn from_rect(text: impl Into<String>, x: i32, y: i32, w: i32, h: i32, confidence: f32) -> Self {
        Self::new(
            text,
            [
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
            confidence,
        )
    }

    /// Bounding region of the polygon, clipped to the image
    pub fn region(&self, width: u32, height: u32) -> Region {
        Region::from_polygon(&self.polygon, width, height)
    }
}

/// A PII finding attached to one OCR box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiTag {
    pub entity_type: String,
    pub score: f32,
    /// Index into the OCR box list passed to the detector
    pub box_index: usize,
}

// ============================================================
// Collaborators
// ============================================================

/// External OCR engine
pub trait OcrEngine {
    fn extract(&self, image: &RgbImage) -> Result<Vec<OcrBox>>;
}

/// External PII detector over OCR boxes
pub trait BoxPiiDetector {
    fn detect(&self, boxes: &[OcrBox]) -> Result<Vec<PiiTag>>;
}

/// External image classifier explained by occlusion search
///
/// `probabilities` returns one value per entry of `labels`, same order.
pub trait LocationClassifier: Sync {
    fn labels(&self) -> &[String];

    fn probabilities(&self, image: &RgbImage) -> saliency::Result<Vec<f32>>;
}

/// Runs a text [`SpanDetector`] over each OCR box
///
/// Each box yields at most one tag per label, carrying the best score seen.
/// Spans without a score count as certain.
pub struct SpanBoxDetector<'a> {
    detector: &'a dyn SpanDetector,
}

impl<'a> SpanBoxDetector<'a> {
    pub fn new(detector: &'a dyn SpanDetector) -> Self {
        Self { detector }
    }
}

impl BoxPiiDetector for SpanBoxDetector<'_> {
    fn detect(&self, boxes: &[OcrBox]) -> Result<Vec<PiiTag>> {
        let mut tags = Vec::new();

        for (index, ocr_box) in boxes.iter().enumerate() {
            if ocr_box.text.trim().is_empty() {
                continue;
            }

            let text_len = ocr_box.text.chars().count();
            let mut best: BTreeMap<String, f32> = BTreeMap::new();
            for raw in self.detector.detect(&ocr_box.text)? {
                let span = raw.validate(self.detector.name(), text_len, self.detector.source())?;
                let score = span.score.unwrap_or(1.0);
                best.entry(span.label)
                    .and_modify(|s| *s = s.max(score))
                    .or_insert(score);
            }

            tags.extend(best.into_iter().map(|(entity_type, score)| PiiTag {
                entity_type,
                score,
                box_index: index,
            }));
        }
        Ok(tags)
    }
}

/// Keep tags whose entity is targeted and whose score is high enough
pub fn filter_tags(tags: Vec<PiiTag>, targets: Option<&LabelSet>, min_score: f32) -> Vec<PiiTag> {
    tags.into_iter()
        .filter(|t| t.score >= min_score)
        .filter(|t| targets.map_or(true, |set| set.contains(&t.entity_type)))
        .collect()
}
