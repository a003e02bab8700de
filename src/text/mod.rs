//! Text span resolver
//!
//! Turns noisy, possibly overlapping spans from several producers into a
//! disjoint, word-aligned span list and a rewritten string with numbered
//! placeholders.
//!
//! # Producers
//!
//! - **Patterns** ([`detector::RegexDetector`], [`pattern::CustomPatternDetector`])
//! - **Models** ([`bio::NerDetector`] over a [`bio::TokenClassifier`],
//!   [`detector::JsonSpanDetector`] for spans computed elsewhere)
//!
//! Pattern spans are seeded before model spans and win exact ties.
//!
//! # Example
//!
//! ```rust
//! use pii_redactor::{RegexDetector, TextRedactionOptions, TextRedactor};
//!
//! let regex = RegexDetector::builtin();
//! let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&regex);
//!
//! let result = redactor.redact("mail me at jo@example.com").unwrap();
//! assert_eq!(result.text, "mail me at [EMAIL_1]");
//! ```

pub mod bio;
pub mod detector;
pub mod pattern;
mod redactor;
pub mod resolve;
pub mod substitute;
mod types;

pub use bio::{bio_to_spans, NerDetector, TokenClassifier, TokenTag};
pub use detector::{JsonSpanDetector, RegexDetector};
pub use pattern::{
    ComponentKind, CustomPattern, CustomPatternDetector, PatternComponent, Quantity, Repeat,
    DEFAULT_REPLACEMENT,
};
pub use redactor::{TextRedaction, TextRedactionOptions, TextRedactionOptionsBuilder, TextRedactor};
pub use substitute::{NumberingMode, PlaceholderStyle};
pub use types::{
    CharIndex, LabelSet, RawSpan, Result, SpanDetector, SpanSource, TextError, TextSpan,
    BLOCK_CHAR, DEFAULT_ALWAYS_KEEP_LABELS, DEFAULT_EXTEND_LABELS, DEFAULT_MAX_GAP_CHARS,
};
