//! Core types for text span resolution

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Default maximum gap (in non-space characters) bridged by coalescing
pub const DEFAULT_MAX_GAP_CHARS: usize = 2;

/// Character used by block-style placeholders
pub const BLOCK_CHAR: char = '\u{2588}';

/// Labels extended to the end of the word by default
pub const DEFAULT_EXTEND_LABELS: &[&str] = &["NAME", "ADDRESS"];

/// Model labels kept even when a pattern span already covers the same range
pub const DEFAULT_ALWAYS_KEEP_LABELS: &[&str] = &["NAME", "ADDRESS"];

// ============================================================
// Error Types
// ============================================================

/// Text redaction error types
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Malformed span from {producer}: {reason}")]
    MalformedSpan { producer: String, reason: String },

    #[error("Detector {name} failed: {message}")]
    Detector { name: String, message: String },

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TextError>;

// ============================================================
// Spans
// ============================================================

/// Producer priority; lower sorts first and wins exact-range ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanSource {
    /// Deterministic high-precision patterns
    Pattern,
    /// Statistical model output
    Model,
}

/// A labelled character range of the input text
///
/// Offsets count Unicode scalar values, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub source: SpanSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<usize>,
}

impl TextSpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>, source: SpanSource) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            source,
            score: None,
            entity_id: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Placeholder token such as `[NAME_1]`; unnumbered spans render as `[NAME]`
    pub fn tag(&self) -> String {
        match self.entity_id {
            Some(id) => format!("[{}_{}]", self.label, id),
            None => format!("[{}]", self.label),
        }
    }
}

/// Unvalidated span record as emitted by a producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default, alias = "entity_type", alias = "entity_group")]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

impl RawSpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            label: Some(label.into()),
            score: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Check the record against a text of `text_len` characters
    ///
    /// The label is trimmed and upper-cased.
    pub fn validate(&self, producer: &str, text_len: usize, source: SpanSource) -> Result<TextSpan> {
        let malformed = |reason: String| TextError::MalformedSpan {
            producer: producer.to_string(),
            reason,
        };

        let start = self.start.ok_or_else(|| malformed("missing start".into()))?;
        let end = self.end.ok_or_else(|| malformed("missing end".into()))?;
        let label = match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_ascii_uppercase(),
            _ => return Err(malformed("missing label".into())),
        };

        if start > end {
            return Err(malformed(format!("start {} after end {}", start, end)));
        }
        if end > text_len {
            return Err(malformed(format!(
                "end {} beyond text length {}",
                end, text_len
            )));
        }

        let mut span = TextSpan::new(start, end, label, source);
        span.score = self.score;
        Ok(span)
    }
}

// ============================================================
// Label Sets
// ============================================================

/// Set of entity labels, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str) {
        let label = label.trim();
        if !label.is_empty() {
            self.0.insert(label.to_ascii_uppercase());
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(&label.trim().to_ascii_uppercase())
    }

    /// Labels present in both sets
    #[must_use]
    pub fn intersection(&self, other: &LabelSet) -> LabelSet {
        LabelSet(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for LabelSet {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl FromStr for LabelSet {
    type Err = String;

    /// Parse a comma separated list such as `NAME,EMAIL`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let set: LabelSet = s.split(',').collect();
        if set.is_empty() {
            return Err("label list is empty".to_string());
        }
        Ok(set)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().collect();
        write!(f, "{}", labels.join(","))
    }
}

// ============================================================
// Producers
// ============================================================

/// A source of candidate spans over a text
pub trait SpanDetector {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Priority of the spans this producer emits
    fn source(&self) -> SpanSource;

    /// Detect spans in `text`; offsets are character offsets
    fn detect(&self, text: &str) -> Result<Vec<RawSpan>>;
}

// ============================================================
// Offsets
// ============================================================

/// Byte to character offset translation for one text
#[derive(Debug)]
pub struct CharIndex {
    byte_starts: Vec<usize>,
    byte_len: usize,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        Self {
            byte_starts: text.char_indices().map(|(b, _)| b).collect(),
            byte_len: text.len(),
        }
    }

    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.byte_starts.len()
    }

    /// Character offset of a byte offset on a char boundary
    pub fn char_offset(&self, byte: usize) -> usize {
        if byte >= self.byte_len {
            return self.byte_starts.len();
        }
        match self.byte_starts.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_span_validate_ok() {
        let span = RawSpan::new(2, 5, "name")
            .with_score(0.9)
            .validate("ner", 10, SpanSource::Model)
            .unwrap();
        assert_eq!(span.start, 2);
        assert_eq!(span.end, 5);
        // Labels are normalized to upper case
        assert_eq!(span.label, "NAME");
        assert_eq!(span.score, Some(0.9));
        assert_eq!(span.source, SpanSource::Model);
    }

    #[test]
    fn test_raw_span_validate_malformed() {
        let cases = [
            RawSpan {
                start: None,
                ..RawSpan::new(0, 1, "X")
            },
            RawSpan {
                end: None,
                ..RawSpan::new(0, 1, "X")
            },
            RawSpan {
                label: Some("  ".into()),
                ..RawSpan::new(0, 1, "X")
            },
            RawSpan::new(4, 2, "X"),
            RawSpan::new(0, 11, "X"),
        ];
        for raw in cases {
            assert!(matches!(
                raw.validate("p", 10, SpanSource::Pattern),
                Err(TextError::MalformedSpan { .. })
            ));
        }
    }

    #[test]
    fn test_raw_span_deserialize_aliases() {
        let raw: RawSpan =
            serde_json::from_str(r#"{"start": 1, "end": 3, "entity_type": "EMAIL"}"#).unwrap();
        assert_eq!(raw.label.as_deref(), Some("EMAIL"));
        assert_eq!(raw.score, None);

        let partial: RawSpan = serde_json::from_str(r#"{"end": 3}"#).unwrap();
        assert_eq!(partial.start, None);
    }

    #[test]
    fn test_span_source_ordering() {
        assert!(SpanSource::Pattern < SpanSource::Model);
    }

    #[test]
    fn test_span_tag() {
        let mut span = TextSpan::new(0, 4, "NAME", SpanSource::Model);
        assert_eq!(span.tag(), "[NAME]");
        span.entity_id = Some(2);
        assert_eq!(span.tag(), "[NAME_2]");
    }

    #[test]
    fn test_label_set_case_insensitive() {
        let set: LabelSet = "name, Email".parse().unwrap();
        assert!(set.contains("NAME"));
        assert!(set.contains("email"));
        assert!(!set.contains("PHONE"));
        assert_eq!(set.to_string(), "EMAIL,NAME");
        assert!(" , ".parse::<LabelSet>().is_err());
    }

    #[test]
    fn test_label_set_intersection() {
        let a: LabelSet = ["NAME", "ADDRESS"].into_iter().collect();
        let b: LabelSet = ["NAME", "EMAIL"].into_iter().collect();
        let both = a.intersection(&b);
        assert_eq!(both.len(), 1);
        assert!(both.contains("NAME"));
    }

    #[test]
    fn test_char_index_multibyte() {
        let text = "Zoë @ü x";
        let index = CharIndex::new(text);
        assert_eq!(index.char_len(), 8);
        let at = text.find('@').unwrap();
        assert_eq!(index.char_offset(at), 4);
        assert_eq!(index.char_offset(text.len()), 8);
    }
}
