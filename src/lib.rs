//! pii-redactor - Rule-based PII redaction for text and images
//!
//! Detection models stay outside this crate. What lives here is the
//! deterministic layer that decides which characters and pixels are hidden:
//!
//! - [`text`] - span resolution, coalescing and placeholder substitution
//! - [`saliency`] - occlusion saliency search over a black-box scorer
//! - [`mask`] - saliency thresholding, dilation and region extraction
//! - [`blur`] - in-place Gaussian and mosaic region blurring
//! - [`pipeline`] - OCR and location redaction built from the above
//!
//! # Example
//!
//! ```rust
//! use pii_redactor::{RegexDetector, TextRedactionOptions, TextRedactor};
//!
//! let regex = RegexDetector::builtin();
//! let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&regex);
//! let result = redactor.redact("call 555-123-4567").unwrap();
//! assert_eq!(result.text, "call [PHONE_1]");
//! ```

pub mod blur;
pub mod cli;
pub mod config;
pub mod mask;
pub mod pipeline;
pub mod progress;
pub mod saliency;
pub mod text;

// Blur
pub use blur::{BlurError, BlurMethod, BlurOptions, BlurOptionsBuilder, Point, Region, RegionBlur};

// Mask
pub use mask::{MaskEngine, MaskError, MaskMode, MaskOptions, MaskResult, SaliencyMap};

// Saliency
pub use saliency::{FillStrategy, OcclusionOptions, OcclusionSearch, SaliencyError, Scorer};

// Text
pub use text::{
    CustomPattern, CustomPatternDetector, JsonSpanDetector, LabelSet, NerDetector,
    PlaceholderStyle, RawSpan, RegexDetector, SpanDetector, SpanSource, TextError, TextRedaction,
    TextRedactionOptions, TextRedactor, TextSpan,
};

// Pipelines
pub use pipeline::{
    LocationClassifier, LocationPipelineOptions, LocationRedactionPipeline, OcrBox, OcrEngine,
    OcrPipelineOptions, OcrRedactionPipeline, PiiTag, PipelineError, SpanBoxDetector,
};

// CLI and config
pub use cli::{BlurArgs, Cli, Commands, MaskArgs, PatternArgs, TextArgs};
pub use config::{CliOverrides, Config, ConfigError};

// Progress
pub use progress::{OutputMode, ProgressCallback, ProgressTracker, RedactionStage, SilentProgress};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
}
