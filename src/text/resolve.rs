//! Span resolution passes
//!
//! Each pass takes ownership of a span list and returns the next one:
//!
//! 1. [`filter`] - label allow-list and minimum score
//! 2. [`seed`] - producer priority with "always keep" labels
//! 3. [`resolve_overlaps`] - earliest, then longest, span wins
//! 4. [`coalesce`] - same-label neighbours separated by a short tail
//! 5. [`extend_to_word_end`] - finish words cut by subword tokenization

use regex::Regex;
use std::cmp::Reverse;
use std::collections::HashSet;

use super::types::{LabelSet, Result, TextError, TextSpan};

/// Keep spans whose label is allowed and whose score reaches `min_score`
///
/// Spans without a score are never dropped on score.
pub fn filter(spans: Vec<TextSpan>, allow: Option<&LabelSet>, min_score: f32) -> Vec<TextSpan> {
    spans
        .into_iter()
        .filter(|s| allow.map_or(true, |set| set.contains(&s.label)))
        .filter(|s| s.score.map_or(true, |score| score >= min_score))
        .collect()
}

/// Order candidates by producer priority
///
/// Highest-priority spans are all kept. A lower-priority span whose exact
/// range was already produced at a higher priority is dropped unless its
/// label is in `always_keep`. Order within one priority is preserved.
pub fn seed(mut spans: Vec<TextSpan>, always_keep: &LabelSet) -> Vec<TextSpan> {
    spans.sort_by_key(|s| s.source);

    let mut seeded = Vec::with_capacity(spans.len());
    let mut covered: HashSet<(usize, usize)> = HashSet::new();
    let mut level: Vec<(usize, usize)> = Vec::new();
    let mut current = None;

    for span in spans {
        if current != Some(span.source) {
            covered.extend(level.drain(..));
            current = Some(span.source);
        }

        let range = (span.start, span.end);
        if covered.contains(&range) && !always_keep.contains(&span.label) {
            continue;
        }
        level.push(range);
        seeded.push(span);
    }
    seeded
}

/// Reduce candidates to a disjoint list
///
/// Candidates are ordered by start, then longest first (stable, so equal
/// candidates keep seeding order). Scanning left to right, a candidate is
/// kept when it starts at or after the end of the last kept span; otherwise
/// it replaces that span only when strictly longer.
pub fn resolve_overlaps(mut spans: Vec<TextSpan>) -> Vec<TextSpan> {
    spans.sort_by_key(|s| (s.start, Reverse(s.len())));

    let mut kept: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(last) if span.start < last.end => {
                if span.len() > last.len() {
                    *last = span;
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

/// Regex matching a gap that may be absorbed by coalescing
pub fn gap_pattern(max_gap_chars: usize) -> Result<Regex> {
    Regex::new(&format!(r"^\s*[-/#A-Za-z0-9]{{0,{}}}\s*$", max_gap_chars))
        .map_err(|e| TextError::InvalidPattern(e.to_string()))
}

/// Merge same-label neighbours whose gap is a short tail
///
/// `chars` is the text as characters. A merged span takes the end of the
/// later span. Running the pass again on its own output changes nothing.
pub fn coalesce(
    mut spans: Vec<TextSpan>,
    chars: &[char],
    max_gap_chars: usize,
) -> Result<Vec<TextSpan>> {
    if spans.len() < 2 {
        return Ok(spans);
    }
    let gap_re = gap_pattern(max_gap_chars)?;
    spans.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            if prev.label == span.label {
                let gap: String = if span.start > prev.end {
                    chars[prev.end..span.start].iter().collect()
                } else {
                    String::new()
                };
                if gap_re.is_match(&gap) {
                    prev.end = prev.end.max(span.end);
                    continue;
                }
            }
        }
        merged.push(span);
    }
    Ok(merged)
}

/// Characters that continue a word: letters, digits, apostrophes, hyphen
pub fn is_word_continuation(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '\'' | '\u{2019}' | '-')
}

/// Extend spans with a label in `labels` to the end of the current word
///
/// Input must be sorted and disjoint. An extension stops at the text end and
/// at the start of the next span, so the output stays disjoint.
pub fn extend_to_word_end(
    mut spans: Vec<TextSpan>,
    chars: &[char],
    labels: &LabelSet,
) -> Vec<TextSpan> {
    let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();

    for (i, span) in spans.iter_mut().enumerate() {
        if !labels.contains(&span.label) {
            continue;
        }
        let limit = starts
            .get(i + 1)
            .copied()
            .unwrap_or(chars.len())
            .min(chars.len());
        while span.end < limit && is_word_continuation(chars[span.end]) {
            span.end += 1;
        }
    }
    spans
}

/// Whether a span list is sorted and pairwise disjoint
pub fn is_disjoint(spans: &[TextSpan]) -> bool {
    spans.windows(2).all(|w| w[0].end <= w[1].start)
}
