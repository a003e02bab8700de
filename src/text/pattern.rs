//! Custom pattern builder
//!
//! Users describe a pattern as a sequence of components instead of writing a
//! regular expression:
//!
//! ```json
//! [
//!   {"type": "literal", "value": "EMP-"},
//!   {"type": "digits", "quantity": 4}
//! ]
//! ```
//!
//! Every component is validated before anything is matched; an invalid
//! sequence never produces a partial pattern.

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{CharIndex, RawSpan, Result, SpanDetector, SpanSource, TextError};

/// Default replacement for [`CustomPattern::replace_all`]
pub const DEFAULT_REPLACEMENT: &str = "[BLURRED]";

/// Character class of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Literal,
    Letters,
    UppercaseLetters,
    LowercaseLetters,
    Digits,
    AnyChar,
    Whitespace,
    NonWhitespace,
    WordChar,
    NonWordChar,
}

impl ComponentKind {
    fn class(&self) -> Option<&'static str> {
        match self {
            ComponentKind::Literal => None,
            ComponentKind::Letters => Some("[a-zA-Z]"),
            ComponentKind::UppercaseLetters => Some("[A-Z]"),
            ComponentKind::LowercaseLetters => Some("[a-z]"),
            ComponentKind::Digits => Some(r"\d"),
            ComponentKind::AnyChar => Some("."),
            ComponentKind::Whitespace => Some(r"\s"),
            ComponentKind::NonWhitespace => Some(r"\S"),
            ComponentKind::WordChar => Some(r"\w"),
            ComponentKind::NonWordChar => Some(r"\W"),
        }
    }
}

/// Named repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    OneOrMore,
    ZeroOrMore,
    Optional,
}

/// How many times a component repeats
///
/// Counts are signed so that negative input can be reported instead of
/// failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Exactly(i64),
    Range(i64, i64),
    Repeat(Repeat),
}

impl Quantity {
    fn quantifier(&self) -> Result<String> {
        match *self {
            Quantity::Exactly(n) if n < 0 => Err(TextError::InvalidPattern(format!(
                "quantity must be non-negative, got {}",
                n
            ))),
            Quantity::Exactly(1) => Ok(String::new()),
            Quantity::Exactly(n) => Ok(format!("{{{}}}", n)),
            Quantity::Range(min, max) if min < 0 || max < min => {
                Err(TextError::InvalidPattern(format!(
                    "range must satisfy 0 <= min <= max, got [{}, {}]",
                    min, max
                )))
            }
            Quantity::Range(min, max) => Ok(format!("{{{},{}}}", min, max)),
            Quantity::Repeat(Repeat::OneOrMore) => Ok("+".to_string()),
            Quantity::Repeat(Repeat::ZeroOrMore) => Ok("*".to_string()),
            Quantity::Repeat(Repeat::Optional) => Ok("?".to_string()),
        }
    }
}

/// One element of a pattern sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternComponent {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
}

impl PatternComponent {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            value: None,
            quantity: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(ComponentKind::Literal)
        }
    }

    #[must_use]
    pub fn times(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Regex fragment for this component
    pub fn to_regex(&self) -> Result<String> {
        let quantifier = match &self.quantity {
            Some(q) => q.quantifier()?,
            None => String::new(),
        };

        let atom = match self.kind.class() {
            Some(class) => class.to_string(),
            None => {
                let value = self.value.as_deref().unwrap_or_default();
                if value.is_empty() {
                    return Err(TextError::InvalidPattern(
                        "literal component requires a value".to_string(),
                    ));
                }
                let escaped = regex::escape(value);
                // A quantifier applies to the whole literal, not its last char
                if !quantifier.is_empty() && value.chars().count() > 1 {
                    format!("(?:{})", escaped)
                } else {
                    escaped
                }
            }
        };

        Ok(format!("{}{}", atom, quantifier))
    }
}

/// A validated, compiled pattern sequence
#[derive(Debug, Clone)]
pub struct CustomPattern {
    components: Vec<PatternComponent>,
    regex: Regex,
}

impl CustomPattern {
    /// Validate and compile a component sequence
    pub fn compile(components: Vec<PatternComponent>) -> Result<Self> {
        let source = components
            .iter()
            .map(PatternComponent::to_regex)
            .collect::<Result<Vec<_>>>()?
            .concat();

        if source.is_empty() {
            return Err(TextError::InvalidPattern(
                "pattern sequence is empty".to_string(),
            ));
        }

        let regex = Regex::new(&source).map_err(|e| {
            TextError::InvalidPattern(format!("generated pattern '{}': {}", source, e))
        })?;

        Ok(Self { components, regex })
    }

    /// Parse a JSON array of components and compile it
    pub fn from_json(json: &str) -> Result<Self> {
        let components: Vec<PatternComponent> =
            serde_json::from_str(json).map_err(|e| TextError::InvalidPattern(e.to_string()))?;
        Self::compile(components)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TextError::InputNotFound(path.to_path_buf()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Generated regular expression
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn components(&self) -> &[PatternComponent] {
        &self.components
    }

    /// Replace every match with `replacement`, taken literally
    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        self.regex
            .replace_all(text, NoExpand(replacement))
            .into_owned()
    }

    /// Character ranges of all non-empty matches
    pub fn find_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let index = CharIndex::new(text);
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| (index.char_offset(m.start()), index.char_offset(m.end())))
            .collect()
    }
}

/// A custom pattern used as a labelled, pattern-priority span producer
#[derive(Debug, Clone)]
pub struct CustomPatternDetector {
    label: String,
    pattern: CustomPattern,
}

impl CustomPatternDetector {
    pub fn new(label: impl Into<String>, pattern: CustomPattern) -> Self {
        Self {
            label: label.into(),
            pattern,
        }
    }
}

impl SpanDetector for CustomPatternDetector {
    fn name(&self) -> &str {
        &self.label
    }

    fn source(&self) -> SpanSource {
        SpanSource::Pattern
    }

    fn detect(&self, text: &str) -> Result<Vec<RawSpan>> {
        Ok(self
            .pattern
            .find_ranges(text)
            .into_iter()
            .map(|(start, end)| RawSpan::new(start, end, self.label.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_id_pattern() {
        let pattern = CustomPattern::compile(vec![
            PatternComponent::literal("EMP-"),
            PatternComponent::new(ComponentKind::Digits).times(Quantity::Exactly(4)),
        ])
        .unwrap();

        assert_eq!(pattern.as_str(), r"EMP\-\d{4}");
        assert_eq!(
            pattern.replace_all("ids EMP-1234, EMP-99", DEFAULT_REPLACEMENT),
            "ids [BLURRED], EMP-99"
        );
    }

    #[test]
    fn test_from_json_all_quantities() {
        let json = r#"[
            {"type": "uppercase_letters", "quantity": [2, 3]},
            {"type": "whitespace", "quantity": "optional"},
            {"type": "digits", "quantity": "one_or_more"},
            {"type": "non_word_char", "quantity": "zero_or_more"}
        ]"#;
        let pattern = CustomPattern::from_json(json).unwrap();
        assert_eq!(pattern.as_str(), r"[A-Z]{2,3}\s?\d+\W*");
        assert_eq!(pattern.components().len(), 4);
        assert_eq!(pattern.replace_all("code AB 12!", "#"), "code #");
    }

    #[test]
    fn test_quantified_literal_is_grouped() {
        let pattern = CustomPattern::compile(vec![
            PatternComponent::literal("ab").times(Quantity::Exactly(2))
        ])
        .unwrap();
        assert_eq!(pattern.replace_all("abab abb", "X"), "X abb");
    }

    #[test]
    fn test_replacement_is_literal() {
        let pattern = CustomPattern::compile(vec![PatternComponent::new(ComponentKind::Digits)
            .times(Quantity::Repeat(Repeat::OneOrMore))])
        .unwrap();
        assert_eq!(pattern.replace_all("pin 4321", "$0"), "pin $0");
    }

    #[test]
    fn test_invalid_components_rejected() {
        let cases = [
            r#"[{"type": "emoji"}]"#,
            r#"[{"type": "literal"}]"#,
            r#"[{"type": "literal", "value": ""}]"#,
            r#"[{"type": "digits", "quantity": -1}]"#,
            r#"[{"type": "digits", "quantity": [3, 1]}]"#,
            r#"[{"type": "digits", "quantity": [-1, 2]}]"#,
            r#"[{"type": "digits", "quantity": "lots"}]"#,
            r#"[]"#,
        ];
        for json in cases {
            assert!(
                matches!(CustomPattern::from_json(json), Err(TextError::InvalidPattern(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_detector_emits_char_ranges() {
        let pattern = CustomPattern::compile(vec![
            PatternComponent::literal("#"),
            PatternComponent::new(ComponentKind::Digits).times(Quantity::Range(2, 4)),
        ])
        .unwrap();
        let detector = CustomPatternDetector::new("TICKET", pattern);

        let spans = detector.detect("Ünïcode #123 and #9").unwrap();
        assert_eq!(spans, vec![RawSpan::new(8, 12, "TICKET")]);
        assert_eq!(detector.source(), SpanSource::Pattern);
    }
}
