//! Built-in span producers
//!
//! - [`RegexDetector`] - high-precision patterns for structured PII
//! - [`JsonSpanDetector`] - spans computed elsewhere and loaded from JSON

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::types::{CharIndex, RawSpan, Result, SpanDetector, SpanSource, TextError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("static regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\+?\d{1,3}[-.\s]?)?(?:\(?\d{1,4}\)?[-.\s]?)?\d{3,4}[-.\s]?\d{3,4}\b")
        .expect("static regex")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhttps?://\S+").expect("static regex"));

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w{1,32}").expect("static regex"));

/// Regex-backed producer emitting pattern-priority spans
#[derive(Debug, Clone)]
pub struct RegexDetector {
    name: String,
    patterns: Vec<(String, Regex)>,
}

impl Default for RegexDetector {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RegexDetector {
    /// Empty detector; add patterns with [`with_pattern`](Self::with_pattern)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
        }
    }

    /// `EMAIL`, `PHONE`, `URL_PERSONAL` and `USERNAME`, in that order
    pub fn builtin() -> Self {
        Self::new("regex")
            .with_pattern("EMAIL", EMAIL_RE.clone())
            .with_pattern("PHONE", PHONE_RE.clone())
            .with_pattern("URL_PERSONAL", URL_RE.clone())
            .with_pattern("USERNAME", USERNAME_RE.clone())
    }

    #[must_use]
    pub fn with_pattern(mut self, label: impl Into<String>, regex: Regex) -> Self {
        self.patterns.push((label.into(), regex));
        self
    }

    /// Compile `pattern` and add it under `label`
    pub fn add_pattern(&mut self, label: &str, pattern: &str) -> Result<()> {
        let regex =
            Regex::new(pattern).map_err(|e| TextError::InvalidPattern(e.to_string()))?;
        self.patterns.push((label.to_string(), regex));
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(label, _)| label.as_str())
    }
}

impl SpanDetector for RegexDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SpanSource {
        SpanSource::Pattern
    }

    fn detect(&self, text: &str) -> Result<Vec<RawSpan>> {
        let index = CharIndex::new(text);
        let mut spans = Vec::new();

        // Grouped per pattern, matches in text order within each group
        for (label, regex) in &self.patterns {
            for m in regex.find_iter(text) {
                spans.push(RawSpan::new(
                    index.char_offset(m.start()),
                    index.char_offset(m.end()),
                    label.as_str(),
                ));
            }
        }
        Ok(spans)
    }
}

/// Producer replaying spans computed by an external model
#[derive(Debug, Clone)]
pub struct JsonSpanDetector {
    name: String,
    source: SpanSource,
    spans: Vec<RawSpan>,
}

impl JsonSpanDetector {
    pub fn new(name: impl Into<String>, spans: Vec<RawSpan>) -> Self {
        Self {
            name: name.into(),
            source: SpanSource::Model,
            spans,
        }
    }

    /// Parse a JSON array of span records
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let spans: Vec<RawSpan> = serde_json::from_str(json)?;
        Ok(Self::new(name, spans))
    }

    /// Load a JSON array of span records from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TextError::InputNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "json".to_string());
        Self::from_json(name, &json)
    }

    #[must_use]
    pub fn with_source(mut self, source: SpanSource) -> Self {
        self.source = source;
        self
    }
}

impl SpanDetector for JsonSpanDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SpanSource {
        self.source
    }

    fn detect(&self, _text: &str) -> Result<Vec<RawSpan>> {
        Ok(self.spans.clone())
    }
}
