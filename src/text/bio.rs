//! BIO tag decoding for token classifiers
//!
//! A token classifier labels each token `B-X` (begin entity X), `I-X`
//! (inside entity X) or `O` (outside). Decoding turns the tag stream into
//! character spans.

use serde::{Deserialize, Serialize};

use super::types::{RawSpan, Result, SpanDetector, SpanSource};

/// One classified token with character offsets into the source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTag {
    pub start: usize,
    pub end: usize,
    pub tag: String,
    #[serde(default)]
    pub score: Option<f32>,
}

impl TokenTag {
    pub fn new(start: usize, end: usize, tag: impl Into<String>) -> Self {
        Self {
            start,
            end,
            tag: tag.into(),
            score: None,
        }
    }
}

/// External token classification model (NER)
pub trait TokenClassifier {
    /// Classify the tokens of `text`, in text order
    fn classify(&self, text: &str) -> Result<Vec<TokenTag>>;
}

enum Bio<'a> {
    Begin(&'a str),
    Inside(&'a str),
    Outside,
}

fn parse_tag(tag: &str) -> Bio<'_> {
    if let Some(label) = tag.strip_prefix("B-") {
        Bio::Begin(label)
    } else if let Some(label) = tag.strip_prefix("I-") {
        Bio::Inside(label)
    } else {
        Bio::Outside
    }
}

fn merge_score(current: Option<f32>, next: Option<f32>) -> Option<f32> {
    match (current, next) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Decode BIO-tagged tokens into spans
///
/// `I-X` continues the open span when it has label `X` and starts at most
/// one character after its end; otherwise it opens a new span. Tokens with
/// an empty range (special tokens) are ignored. Span scores are the lowest
/// token score.
pub fn bio_to_spans(tokens: &[TokenTag]) -> Vec<RawSpan> {
    let mut spans = Vec::new();
    let mut current: Option<RawSpan> = None;

    for token in tokens.iter().filter(|t| t.start < t.end) {
        match parse_tag(&token.tag) {
            Bio::Begin(label) => {
                spans.extend(current.take());
                current = Some(span_for(token, label));
            }
            Bio::Inside(label) => {
                let continues = current.as_ref().is_some_and(|cur| {
                    cur.label.as_deref() == Some(label)
                        && cur.end.is_some_and(|end| token.start <= end + 1)
                });
                if continues {
                    if let Some(cur) = current.as_mut() {
                        cur.end = Some(token.end);
                        cur.score = merge_score(cur.score, token.score);
                    }
                } else {
                    spans.extend(current.take());
                    current = Some(span_for(token, label));
                }
            }
            Bio::Outside => spans.extend(current.take()),
        }
    }
    spans.extend(current);
    spans
}

fn span_for(token: &TokenTag, label: &str) -> RawSpan {
    RawSpan {
        start: Some(token.start),
        end: Some(token.end),
        label: Some(label.to_string()),
        score: token.score,
    }
}

/// Adapts a [`TokenClassifier`] into a model-priority span producer
pub struct NerDetector<'a> {
    name: String,
    classifier: &'a dyn TokenClassifier,
}

impl<'a> NerDetector<'a> {
    pub fn new(name: impl Into<String>, classifier: &'a dyn TokenClassifier) -> Self {
        Self {
            name: name.into(),
            classifier,
        }
    }
}

impl SpanDetector for NerDetector<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SpanSource {
        SpanSource::Model
    }

    fn detect(&self, text: &str) -> Result<Vec<RawSpan>> {
        let tokens = self.classifier.classify(text)?;
        Ok(bio_to_spans(&tokens))
    }
}
