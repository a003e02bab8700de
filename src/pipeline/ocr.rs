//! OCR text redaction
//!
//! OCR boxes are filtered by recognition confidence, handed to a PII
//! detector, and every tagged box is blurred over its polygon's bounding
//! rectangle.

use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::types::{
    filter_tags, BoxPiiDetector, OcrBox, OcrEngine, PiiTag, PipelineError, Result,
    DEFAULT_MIN_OCR_CONFIDENCE, DEFAULT_MIN_PII_SCORE,
};
use crate::blur::{self, BlurError, BlurOptions, Region, RegionBlur};
use crate::text::LabelSet;

/// Options for OCR text redaction
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPipelineOptions {
    /// Boxes below this recognition confidence are ignored
    pub min_ocr_confidence: f32,

    /// Tags below this detector score are ignored
    pub min_pii_score: f32,

    /// Entity types to redact; `None` redacts everything detected
    pub target_entities: Option<LabelSet>,

    pub blur: BlurOptions,
}

impl Default for OcrPipelineOptions {
    fn default() -> Self {
        Self {
            min_ocr_confidence: DEFAULT_MIN_OCR_CONFIDENCE,
            min_pii_score: DEFAULT_MIN_PII_SCORE,
            target_entities: None,
            blur: BlurOptions::default(),
        }
    }
}

impl OcrPipelineOptions {
    pub fn builder() -> OcrPipelineOptionsBuilder {
        OcrPipelineOptionsBuilder::default()
    }
}

/// Builder for OcrPipelineOptions
#[derive(Debug, Default)]
pub struct OcrPipelineOptionsBuilder {
    options: OcrPipelineOptions,
}

impl OcrPipelineOptionsBuilder {
    #[must_use]
    pub fn min_ocr_confidence(mut self, confidence: f32) -> Self {
        self.options.min_ocr_confidence = confidence;
        self
    }

    #[must_use]
    pub fn min_pii_score(mut self, score: f32) -> Self {
        self.options.min_pii_score = score;
        self
    }

    #[must_use]
    pub fn target_entities(mut self, entities: LabelSet) -> Self {
        self.options.target_entities = Some(entities);
        self
    }

    #[must_use]
    pub fn blur(mut self, blur: BlurOptions) -> Self {
        self.options.blur = blur;
        self
    }

    #[must_use]
    pub fn build(self) -> OcrPipelineOptions {
        self.options
    }
}

/// Outcome of OCR redaction on one image
#[derive(Debug, Clone, Serialize)]
pub struct OcrRedactionReport {
    /// Boxes kept after the confidence filter
    pub num_ocr_boxes: usize,
    pub num_pii_tags: usize,
    pub tags: Vec<PiiTag>,
    /// Regions actually blurred
    pub regions: Vec<Region>,
}

/// OCR-driven redaction over caller-owned engines
pub struct OcrRedactionPipeline<'a> {
    ocr: &'a dyn OcrEngine,
    detector: &'a dyn BoxPiiDetector,
    options: OcrPipelineOptions,
}

impl<'a> OcrRedactionPipeline<'a> {
    pub fn new(
        ocr: &'a dyn OcrEngine,
        detector: &'a dyn BoxPiiDetector,
        options: OcrPipelineOptions,
    ) -> Self {
        Self {
            ocr,
            detector,
            options,
        }
    }

    pub fn options(&self) -> &OcrPipelineOptions {
        &self.options
    }

    /// Drop boxes below the confidence floor; unscored boxes are kept
    pub fn confident_boxes(&self, boxes: Vec<OcrBox>) -> Vec<OcrBox> {
        boxes
            .into_iter()
            .filter(|b| {
                b.confidence
                    .map_or(true, |c| c >= self.options.min_ocr_confidence)
            })
            .collect()
    }

    /// Redact `image` in place
    ///
    /// Every tag must reference a kept box; an out-of-range index fails the
    /// image before anything is blurred.
    pub fn redact(&self, image: &mut RgbImage) -> Result<OcrRedactionReport> {
        let (width, height) = image.dimensions();

        let boxes = self.confident_boxes(self.ocr.extract(image)?);
        let tags = filter_tags(
            self.detector.detect(&boxes)?,
            self.options.target_entities.as_ref(),
            self.options.min_pii_score,
        );

        let regions = tags
            .iter()
            .map(|tag| {
                boxes
                    .get(tag.box_index)
                    .map(|b| b.region(width, height))
                    .ok_or(PipelineError::BoxIndexOutOfRange {
                        index: tag.box_index,
                        len: boxes.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let applied = RegionBlur::apply_all(image, &regions, &self.options.blur);
        debug!(
            boxes = boxes.len(),
            tags = tags.len(),
            applied,
            "ocr redaction"
        );

        Ok(OcrRedactionReport {
            num_ocr_boxes: boxes.len(),
            num_pii_tags: tags.len(),
            tags,
            regions: regions.into_iter().filter(|r| !r.is_empty()).collect(),
        })
    }

    /// Load, redact and save one image file
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<OcrRedactionReport> {
        let mut image = blur::load_rgb(input)?;
        let report = self.redact(&mut image)?;
        image
            .save(output)
            .map_err(|e| BlurError::InvalidImage(e.to_string()))?;

        info!(
            input = %input.display(),
            tags = report.num_pii_tags,
            "redacted text in image"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::SpanBoxDetector;
    use crate::text::RegexDetector;
    use image::Rgb;

    struct FixedOcr(Vec<OcrBox>);

    impl OcrEngine for FixedOcr {
        fn extract(&self, _image: &RgbImage) -> Result<Vec<OcrBox>> {
            Ok(self.0.clone())
        }
    }

    struct FixedTags(Vec<PiiTag>);

    impl BoxPiiDetector for FixedTags {
        fn detect(&self, _boxes: &[OcrBox]) -> Result<Vec<PiiTag>> {
            Ok(self.0.clone())
        }
    }

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    fn tag(entity: &str, score: f32, index: usize) -> PiiTag {
        PiiTag {
            entity_type: entity.to_string(),
            score,
            box_index: index,
        }
    }

    #[test]
    fn test_blurs_tagged_box_only() {
        let ocr = FixedOcr(vec![
            OcrBox::from_rect("jo@example.com", 10, 10, 20, 10, 0.9),
            OcrBox::from_rect("Total", 40, 10, 20, 10, 0.9),
        ]);
        let regex = RegexDetector::builtin();
        let detector = SpanBoxDetector::new(&regex);
        let options = OcrPipelineOptions::builder()
            .target_entities("EMAIL".parse().unwrap())
            .blur(BlurOptions::gaussian(7))
            .build();
        let pipeline = OcrRedactionPipeline::new(&ocr, &detector, options);

        let mut image = striped(80, 40);
        let original = image.clone();
        let report = pipeline.redact(&mut image).unwrap();

        assert_eq!(report.num_ocr_boxes, 2);
        assert_eq!(report.num_pii_tags, 1);
        assert_eq!(report.regions, vec![Region::new(10, 10, 20, 10)]);
        assert_ne!(image.get_pixel(20, 15), original.get_pixel(20, 15));
        assert_eq!(image.get_pixel(50, 15), original.get_pixel(50, 15));
    }

    #[test]
    fn test_low_confidence_boxes_dropped() {
        let ocr = FixedOcr(vec![
            OcrBox::from_rect("a", 0, 0, 5, 5, 0.1),
            OcrBox::from_rect("b", 0, 0, 5, 5, 0.5),
            OcrBox {
                confidence: None,
                ..OcrBox::from_rect("c", 0, 0, 5, 5, 0.0)
            },
        ]);
        let detector = FixedTags(vec![]);
        let pipeline = OcrRedactionPipeline::new(&ocr, &detector, OcrPipelineOptions::default());

        let report = pipeline.redact(&mut striped(10, 10)).unwrap();
        assert_eq!(report.num_ocr_boxes, 2);
    }

    #[test]
    fn test_low_score_tags_ignored() {
        let ocr = FixedOcr(vec![OcrBox::from_rect("x", 0, 0, 6, 6, 0.9)]);
        let detector = FixedTags(vec![tag("PERSON", 0.1, 0)]);
        let pipeline = OcrRedactionPipeline::new(&ocr, &detector, OcrPipelineOptions::default());

        let mut image = striped(10, 10);
        let original = image.clone();
        let report = pipeline.redact(&mut image).unwrap();
        assert_eq!(report.num_pii_tags, 0);
        assert_eq!(image, original);
    }

    #[test]
    fn test_box_index_out_of_range() {
        let ocr = FixedOcr(vec![OcrBox::from_rect("x", 0, 0, 6, 6, 0.9)]);
        let detector = FixedTags(vec![tag("PERSON", 0.9, 0), tag("PERSON", 0.9, 3)]);
        let pipeline = OcrRedactionPipeline::new(&ocr, &detector, OcrPipelineOptions::default());

        let mut image = striped(10, 10);
        let original = image.clone();
        let result = pipeline.redact(&mut image);
        assert!(matches!(
            result,
            Err(PipelineError::BoxIndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(image, original);
    }

    #[test]
    fn test_process_file_missing_input() {
        let ocr = FixedOcr(vec![]);
        let detector = FixedTags(vec![]);
        let pipeline = OcrRedactionPipeline::new(&ocr, &detector, OcrPipelineOptions::default());
        let result = pipeline.process_file(Path::new("/nonexistent/a.png"), Path::new("/tmp/b.png"));
        assert!(matches!(
            result,
            Err(PipelineError::Blur(BlurError::ImageNotFound(_)))
        ));
    }
}
