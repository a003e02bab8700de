//! Entity numbering and placeholder substitution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::types::{TextSpan, BLOCK_CHAR};

/// How entity numbers are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingMode {
    /// `NAME_1`, `NAME_2`, ... in left-to-right order
    #[default]
    Sequential,
    /// Identical text of the same label shares one number
    UniqueText,
}

/// How a span is rendered in the output text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `[LABEL_n]`
    #[default]
    Tags,
    /// One block character per redacted character
    Block,
}

impl FromStr for PlaceholderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tags" | "tag" => Ok(PlaceholderStyle::Tags),
            "block" | "blocks" => Ok(PlaceholderStyle::Block),
            other => Err(format!("unknown placeholder style '{}'", other)),
        }
    }
}

/// Assign per-label entity numbers to sorted, disjoint spans
pub fn assign_entity_ids(spans: &mut [TextSpan], chars: &[char], mode: NumberingMode) {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for span in spans.iter_mut() {
        let id = match mode {
            NumberingMode::Sequential => next_id(&mut counters, &span.label),
            NumberingMode::UniqueText => {
                let text: String = chars[span.start..span.end].iter().collect();
                let key = (span.label.clone(), text);
                match seen.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = next_id(&mut counters, &span.label);
                        seen.insert(key, id);
                        id
                    }
                }
            }
        };
        span.entity_id = Some(id);
    }
}

fn next_id(counters: &mut HashMap<String, usize>, label: &str) -> usize {
    let counter = counters.entry(label.to_string()).or_insert(0);
    *counter += 1;
    *counter
}

/// Rebuild the text with every span replaced by its placeholder
pub fn render(chars: &[char], spans: &[TextSpan], style: PlaceholderStyle) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut last = 0;

    for span in spans {
        out.extend(&chars[last..span.start]);
        match style {
            PlaceholderStyle::Tags => out.push_str(&span.tag()),
            PlaceholderStyle::Block => out.extend(std::iter::repeat(BLOCK_CHAR).take(span.len())),
        }
        last = span.end;
    }
    out.extend(&chars[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::types::SpanSource;

    fn spans_for(text: &str, ranges: &[(usize, usize, &str)]) -> (Vec<char>, Vec<TextSpan>) {
        let chars = text.chars().collect();
        let spans = ranges
            .iter()
            .map(|&(s, e, l)| TextSpan::new(s, e, l, SpanSource::Model))
            .collect();
        (chars, spans)
    }

    #[test]
    fn test_sequential_numbering() {
        let (chars, mut spans) = spans_for(
            "Ann met Bob and Ann",
            &[(0, 3, "NAME"), (8, 11, "NAME"), (16, 19, "NAME")],
        );
        assign_entity_ids(&mut spans, &chars, NumberingMode::Sequential);
        let ids: Vec<_> = spans.iter().map(|s| s.entity_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_unique_text_numbering() {
        let (chars, mut spans) = spans_for(
            "Ann met Bob and Ann",
            &[(0, 3, "NAME"), (8, 11, "NAME"), (16, 19, "NAME")],
        );
        assign_entity_ids(&mut spans, &chars, NumberingMode::UniqueText);
        assert_eq!(
            render(&chars, &spans, PlaceholderStyle::Tags),
            "[NAME_1] met [NAME_2] and [NAME_1]"
        );
    }

    #[test]
    fn test_numbering_per_label() {
        let (chars, mut spans) = spans_for("a b c", &[(0, 1, "NAME"), (2, 3, "EMAIL"), (4, 5, "NAME")]);
        assign_entity_ids(&mut spans, &chars, NumberingMode::Sequential);
        assert_eq!(
            render(&chars, &spans, PlaceholderStyle::Tags),
            "[NAME_1] [EMAIL_1] [NAME_2]"
        );
    }

    #[test]
    fn test_block_style_preserves_length() {
        let (chars, spans) = spans_for("call Zoë now", &[(5, 8, "NAME")]);
        let out = render(&chars, &spans, PlaceholderStyle::Block);
        assert_eq!(out, "call \u{2588}\u{2588}\u{2588} now");
        assert_eq!(out.chars().count(), chars.len());
    }

    #[test]
    fn test_render_without_spans() {
        let chars: Vec<char> = "plain text".chars().collect();
        assert_eq!(render(&chars, &[], PlaceholderStyle::Tags), "plain text");
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("tags".parse::<PlaceholderStyle>(), Ok(PlaceholderStyle::Tags));
        assert_eq!("BLOCK".parse::<PlaceholderStyle>(), Ok(PlaceholderStyle::Block));
        assert!("stars".parse::<PlaceholderStyle>().is_err());
    }
}
