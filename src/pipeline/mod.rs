//! Image redaction pipelines
//!
//! Two configurable cores that wire caller-owned models into the mask and
//! blur engines:
//!
//! - **OCR text** ([`OcrRedactionPipeline`]) - blur OCR boxes tagged as PII
//! - **Location** ([`LocationRedactionPipeline`]) - blur the pixels a scene
//!   classifier relies on most
//!
//! Models are never constructed here. Callers implement [`OcrEngine`],
//! [`BoxPiiDetector`] or [`LocationClassifier`] once and pass references in;
//! which detector runs is decided by the object handed over.
//!
//! # Example
//!
//! ```rust
//! use image::{Rgb, RgbImage};
//! use pii_redactor::pipeline::{
//!     OcrBox, OcrEngine, OcrPipelineOptions, OcrRedactionPipeline, SpanBoxDetector,
//! };
//! use pii_redactor::RegexDetector;
//!
//! struct StaticOcr;
//!
//! impl OcrEngine for StaticOcr {
//!     fn extract(&self, _image: &RgbImage) -> pii_redactor::pipeline::Result<Vec<OcrBox>> {
//!         Ok(vec![OcrBox::from_rect("jo@example.com", 4, 4, 40, 12, 0.95)])
//!     }
//! }
//!
//! let regex = RegexDetector::builtin();
//! let detector = SpanBoxDetector::new(&regex);
//! let pipeline = OcrRedactionPipeline::new(&StaticOcr, &detector, OcrPipelineOptions::default());
//!
//! let mut img = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
//! let report = pipeline.redact(&mut img).unwrap();
//! assert_eq!(report.num_pii_tags, 2);
//! ```

mod location;
mod ocr;
mod types;

pub use location::{
    LabelScorer, LocationPipelineOptions, LocationPipelineOptionsBuilder,
    LocationRedactionPipeline, LocationRedactionReport,
};
pub use ocr::{
    OcrPipelineOptions, OcrPipelineOptionsBuilder, OcrRedactionPipeline, OcrRedactionReport,
};
pub use types::{
    filter_tags, BoxPiiDetector, LocationClassifier, OcrBox, OcrEngine, PiiTag, PipelineError,
    Result, SpanBoxDetector, DEFAULT_LOCATION_BLUR_STRENGTH, DEFAULT_MIN_OCR_CONFIDENCE,
    DEFAULT_MIN_PII_SCORE, DEFAULT_TOP_K,
};
