//! Text redaction driver

use serde::Serialize;
use tracing::{debug, warn};

use super::resolve;
use super::substitute::{self, NumberingMode, PlaceholderStyle};
use super::types::{
    LabelSet, Result, SpanDetector, TextSpan, DEFAULT_ALWAYS_KEEP_LABELS, DEFAULT_EXTEND_LABELS,
    DEFAULT_MAX_GAP_CHARS,
};

/// Options for text redaction
#[derive(Debug, Clone, PartialEq)]
pub struct TextRedactionOptions {
    /// Labels to redact; `None` redacts every label
    pub labels: Option<LabelSet>,

    /// Spans scoring below this are dropped (unscored spans are kept)
    pub min_score: f32,

    /// Gap bound for coalescing same-label neighbours
    pub max_gap_chars: usize,

    /// Labels extended to the end of the word
    pub extend_labels: LabelSet,

    /// Model labels kept even when a pattern span has the same range
    pub always_keep_labels: LabelSet,

    pub numbering: NumberingMode,
    pub style: PlaceholderStyle,
}

impl Default for TextRedactionOptions {
    fn default() -> Self {
        Self {
            labels: None,
            min_score: 0.0,
            max_gap_chars: DEFAULT_MAX_GAP_CHARS,
            extend_labels: DEFAULT_EXTEND_LABELS.iter().collect(),
            always_keep_labels: DEFAULT_ALWAYS_KEEP_LABELS.iter().collect(),
            numbering: NumberingMode::Sequential,
            style: PlaceholderStyle::Tags,
        }
    }
}

impl TextRedactionOptions {
    pub fn builder() -> TextRedactionOptionsBuilder {
        TextRedactionOptionsBuilder::default()
    }

    /// Extendable labels restricted to the allow-list, if any
    pub fn effective_extend_labels(&self) -> LabelSet {
        match &self.labels {
            Some(allow) => self.extend_labels.intersection(allow),
            None => self.extend_labels.clone(),
        }
    }
}

/// Builder for TextRedactionOptions
#[derive(Debug, Default)]
pub struct TextRedactionOptionsBuilder {
    options: TextRedactionOptions,
}

impl TextRedactionOptionsBuilder {
    #[must_use]
    pub fn labels(mut self, labels: LabelSet) -> Self {
        self.options.labels = Some(labels);
        self
    }

    #[must_use]
    pub fn min_score(mut self, score: f32) -> Self {
        self.options.min_score = score;
        self
    }

    #[must_use]
    pub fn max_gap_chars(mut self, n: usize) -> Self {
        self.options.max_gap_chars = n;
        self
    }

    #[must_use]
    pub fn extend_labels(mut self, labels: LabelSet) -> Self {
        self.options.extend_labels = labels;
        self
    }

    #[must_use]
    pub fn always_keep_labels(mut self, labels: LabelSet) -> Self {
        self.options.always_keep_labels = labels;
        self
    }

    #[must_use]
    pub fn numbering(mut self, mode: NumberingMode) -> Self {
        self.options.numbering = mode;
        self
    }

    /// Shorthand for [`NumberingMode::UniqueText`]
    #[must_use]
    pub fn unique_ids(mut self, unique: bool) -> Self {
        self.options.numbering = if unique {
            NumberingMode::UniqueText
        } else {
            NumberingMode::Sequential
        };
        self
    }

    #[must_use]
    pub fn style(mut self, style: PlaceholderStyle) -> Self {
        self.options.style = style;
        self
    }

    #[must_use]
    pub fn build(self) -> TextRedactionOptions {
        self.options
    }
}

/// Outcome of a text redaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRedaction {
    /// Text with placeholders substituted
    pub text: String,

    /// Final spans over the original text, sorted and disjoint
    pub spans: Vec<TextSpan>,
}

/// Runs a set of caller-owned producers and resolves their spans
pub struct TextRedactor<'a> {
    detectors: Vec<&'a dyn SpanDetector>,
    options: TextRedactionOptions,
}

impl<'a> TextRedactor<'a> {
    pub fn new(options: TextRedactionOptions) -> Self {
        Self {
            detectors: Vec::new(),
            options,
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: &'a dyn SpanDetector) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn add_detector(&mut self, detector: &'a dyn SpanDetector) {
        self.detectors.push(detector);
    }

    pub fn options(&self) -> &TextRedactionOptions {
        &self.options
    }

    /// Collect validated spans from every producer
    ///
    /// A producer returning a malformed record loses its whole contribution;
    /// a producer error aborts the call.
    pub fn collect_spans(&self, text: &str, text_len: usize) -> Result<Vec<TextSpan>> {
        let mut spans = Vec::new();

        for detector in &self.detectors {
            let raw = detector.detect(text)?;
            let validated = raw
                .iter()
                .map(|r| r.validate(detector.name(), text_len, detector.source()))
                .collect::<Result<Vec<_>>>();

            match validated {
                Ok(found) => {
                    debug!(detector = detector.name(), spans = found.len(), "collected spans");
                    spans.extend(found);
                }
                Err(e) => warn!(detector = detector.name(), error = %e, "dropping producer output"),
            }
        }
        Ok(spans)
    }

    /// Resolve an already-collected span list into final spans
    pub fn resolve(&self, spans: Vec<TextSpan>, chars: &[char]) -> Result<Vec<TextSpan>> {
        let opts = &self.options;

        let spans = resolve::filter(spans, opts.labels.as_ref(), opts.min_score);
        let spans = resolve::seed(spans, &opts.always_keep_labels);
        let spans = resolve::resolve_overlaps(spans);
        let spans = resolve::coalesce(spans, chars, opts.max_gap_chars)?;
        let mut spans =
            resolve::extend_to_word_end(spans, chars, &opts.effective_extend_labels());

        substitute::assign_entity_ids(&mut spans, chars, opts.numbering);
        Ok(spans)
    }

    /// Detect, resolve and substitute
    pub fn redact(&self, text: &str) -> Result<TextRedaction> {
        if text.is_empty() {
            return Ok(TextRedaction {
                text: String::new(),
                spans: Vec::new(),
            });
        }

        let chars: Vec<char> = text.chars().collect();
        let raw = self.collect_spans(text, chars.len())?;
        let spans = self.resolve(raw, &chars)?;
        let redacted = substitute::render(&chars, &spans, self.options.style);

        debug!(chars = chars.len(), spans = spans.len(), "redacted text");
        Ok(TextRedaction {
            text: redacted,
            spans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::bio::{NerDetector, TokenClassifier, TokenTag};
    use crate::text::detector::{JsonSpanDetector, RegexDetector};
    use crate::text::resolve::is_disjoint;
    use crate::text::types::{RawSpan, SpanSource, TextError};

    const CONTACT: &str = "Contact John Smith at john@example.com or 555-123-4567";

    struct JohnSmith;

    impl TokenClassifier for JohnSmith {
        fn classify(&self, _text: &str) -> Result<Vec<TokenTag>> {
            Ok(vec![
                TokenTag::new(0, 7, "O"),
                TokenTag::new(8, 12, "B-NAME"),
                TokenTag::new(13, 18, "I-NAME"),
                TokenTag::new(19, 21, "O"),
            ])
        }
    }

    struct Failing;

    impl SpanDetector for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn source(&self) -> SpanSource {
            SpanSource::Model
        }
        fn detect(&self, _text: &str) -> Result<Vec<RawSpan>> {
            Err(TextError::Detector {
                name: "failing".into(),
                message: "timeout".into(),
            })
        }
    }

    #[test]
    fn test_contact_round_trip() {
        let regex = RegexDetector::builtin();
        let model = JohnSmith;
        let ner = NerDetector::new("ner", &model);

        let redactor = TextRedactor::new(TextRedactionOptions::default())
            .with_detector(&regex)
            .with_detector(&ner);
        let result = redactor.redact(CONTACT).unwrap();

        assert_eq!(result.text, "Contact [NAME_1] at [EMAIL_1] or [PHONE_1]");
        assert_eq!(result.spans.len(), 3);
        assert!(is_disjoint(&result.spans));
    }

    #[test]
    fn test_empty_text() {
        let regex = RegexDetector::builtin();
        let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&regex);
        let result = redactor.redact("").unwrap();
        assert!(result.text.is_empty());
        assert!(result.spans.is_empty());
    }

    #[test]
    fn test_no_spans_is_identity() {
        let regex = RegexDetector::builtin();
        let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&regex);
        let text = "Nothing personal here.";
        assert_eq!(redactor.redact(text).unwrap().text, text);
    }

    #[test]
    fn test_allow_list_filters_labels() {
        let regex = RegexDetector::builtin();
        let options = TextRedactionOptions::builder()
            .labels("EMAIL".parse().unwrap())
            .build();
        let redactor = TextRedactor::new(options).with_detector(&regex);
        assert_eq!(
            redactor.redact(CONTACT).unwrap().text,
            "Contact John Smith at [EMAIL_1] or 555-123-4567"
        );
    }

    #[test]
    fn test_malformed_producer_dropped() {
        let regex = RegexDetector::builtin();
        let bad = JsonSpanDetector::new(
            "bad",
            vec![RawSpan::new(8, 12, "NAME"), RawSpan::new(0, 500, "NAME")],
        );
        let redactor = TextRedactor::new(TextRedactionOptions::default())
            .with_detector(&bad)
            .with_detector(&regex);

        let result = redactor.redact(CONTACT).unwrap();
        assert_eq!(
            result.text,
            "Contact John Smith at [EMAIL_1] or [PHONE_1]"
        );
    }

    #[test]
    fn test_producer_failure_propagates() {
        let failing = Failing;
        let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&failing);
        assert!(matches!(
            redactor.redact("hello"),
            Err(TextError::Detector { .. })
        ));
    }

    #[test]
    fn test_exact_range_tie_goes_to_pattern() {
        let pattern = JsonSpanDetector::new("rules", vec![RawSpan::new(0, 4, "USERNAME")])
            .with_source(SpanSource::Pattern);
        let model = JsonSpanDetector::new("ner", vec![RawSpan::new(0, 4, "NAME")]);
        let redactor = TextRedactor::new(TextRedactionOptions::default())
            .with_detector(&model)
            .with_detector(&pattern);

        // The model NAME survives seeding but loses the equal-length tie
        let result = redactor.redact("Jane ok").unwrap();
        assert_eq!(result.spans.len(), 1);
        assert_eq!(result.spans[0].label, "USERNAME");
    }

    #[test]
    fn test_word_extension_and_unique_ids() {
        let model = JsonSpanDetector::new(
            "ner",
            vec![
                RawSpan::new(0, 3, "NAME"),
                RawSpan::new(11, 14, "NAME"),
                RawSpan::new(22, 25, "NAME"),
            ],
        );
        let options = TextRedactionOptions::builder().unique_ids(true).build();
        let redactor = TextRedactor::new(options).with_detector(&model);

        let result = redactor.redact("Gonggo and Mariam and Gonggo").unwrap();
        assert_eq!(result.text, "[NAME_1] and [NAME_2] and [NAME_1]");
    }

    #[test]
    fn test_extension_limited_to_allow_list() {
        let model = JsonSpanDetector::new("ner", vec![RawSpan::new(0, 3, "NAME")]);
        let options = TextRedactionOptions::builder()
            .labels("NAME".parse().unwrap())
            .extend_labels("ADDRESS".parse().unwrap())
            .build();
        let redactor = TextRedactor::new(options).with_detector(&model);
        assert_eq!(redactor.redact("Gonggo").unwrap().text, "[NAME_1]ggo");
    }

    #[test]
    fn test_block_style() {
        let regex = RegexDetector::builtin();
        let options = TextRedactionOptions::builder()
            .style(PlaceholderStyle::Block)
            .build();
        let redactor = TextRedactor::new(options).with_detector(&regex);
        let result = redactor.redact("mail a@b.io").unwrap();
        assert_eq!(result.text, "mail \u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}");
    }

    #[test]
    fn test_min_score() {
        let model = JsonSpanDetector::new(
            "ner",
            vec![
                RawSpan::new(0, 3, "NAME").with_score(0.2),
                RawSpan::new(8, 11, "NAME").with_score(0.95),
            ],
        );
        let options = TextRedactionOptions::builder().min_score(0.5).build();
        let redactor = TextRedactor::new(options).with_detector(&model);
        assert_eq!(redactor.redact("Ann and Bob").unwrap().text, "Ann and [NAME_1]");
    }
}
