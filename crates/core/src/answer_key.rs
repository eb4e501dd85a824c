//! Answer-key parsing.
//!
//! Two source shapes are understood:
//!
//! - **Lines**: one record per line, `12 B`, `12-B`, `12: b`, `12) 2`, or
//!   `12. Photosynthesis` (raw text, resolved against options at scoring
//!   time).
//! - **Annotated**: solution-style text where each question is followed by
//!   an explicit "Answer: C" annotation. Pairs are recovered in three passes
//!   of decreasing confidence; see [`parse_key_annotated`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{AnswerKey, Confidence, KeyEntry, KeyValue, Label};

/// Maximum distance, in characters, between a question marker and the
/// "answer" annotation that belongs to it.
pub const ANNOTATION_WINDOW: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    /// Annotated when the text carries "answer" annotations, lines otherwise.
    #[default]
    Auto,
    Lines,
    Annotated,
}

impl FromStr for KeyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(KeyFormat::Auto),
            "lines" => Ok(KeyFormat::Lines),
            "annotated" => Ok(KeyFormat::Annotated),
            other => Err(format!("unknown answer key format: {}", other)),
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Auto => write!(f, "auto"),
            KeyFormat::Lines => write!(f, "lines"),
            KeyFormat::Annotated => write!(f, "annotated"),
        }
    }
}

fn key_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,3})[ \t]*[-:.)]?[ \t]*(.*)$").unwrap())
}

fn question_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^|[\s(])(?:(?i:q(?:uestion|ues|n)?)\.?[ \t]*)?(\d{1,3})[.)]").unwrap()
    })
}

fn answer_annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:answer|ans)\b\.?[ \t]*(?:is[ \t]*)?[:\-]?[ \t]*(?:\(([a-d])\)|([a-d])\b)")
            .unwrap()
    })
}

fn scattered_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,3})[ \t]*[.):\-][ \t]*(?:\(([A-Da-d])\)|([A-Da-d])\b)").unwrap()
    })
}

/// Parse a key in whichever shape `format` selects.
pub fn parse_key(text: &str, format: KeyFormat) -> AnswerKey {
    match format {
        KeyFormat::Lines => parse_key_lines(text),
        KeyFormat::Annotated => parse_key_annotated(text),
        KeyFormat::Auto if answer_annotation_re().is_match(text) => parse_key_annotated(text),
        KeyFormat::Auto => parse_key_lines(text),
    }
}

/// Parse one `number [separator] answer` record per line.
///
/// Lines that do not start with a 1-3 digit number are ignored. A
/// single-character answer in `A-D`, `a-d` or `1-4` becomes a label; any
/// other answer is kept as raw text.
pub fn parse_key_lines(text: &str) -> AnswerKey {
    let mut key = AnswerKey::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(caps) = key_line_re().captures(line) else {
            continue;
        };
        let (Some(number), Some(rest)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if line[number.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let answer = rest.as_str().trim();
        if answer.is_empty() {
            continue;
        }

        let value = match Label::from_single(answer) {
            Some(label) => KeyValue::Label(label),
            None => KeyValue::Raw(answer.to_string()),
        };
        key.insert(number.as_str(), KeyEntry::new(value, Confidence::Explicit));
    }

    key
}

/// A question-number marker: `(number, byte offset)`.
fn question_markers(text: &str) -> Vec<(String, usize)> {
    question_marker_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?;
            if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            Some((number.as_str().to_string(), number.start()))
        })
        .collect()
}

/// An "answer" annotation: `(label, byte offset)`.
fn answer_annotations(text: &str) -> Vec<(Label, usize)> {
    answer_annotation_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = caps.get(1).or_else(|| caps.get(2))?;
            let label = letter.as_str().chars().next().and_then(Label::from_char)?;
            Some((label, whole.start()))
        })
        .collect()
}

/// Parse solution-style text with explicit "answer" annotations.
///
/// 1. **Annotated**: each annotation is paired with the nearest preceding
///    question marker, provided the marker lies within
///    [`ANNOTATION_WINDOW`] characters.
/// 2. **Positional**: only when pass 1 finds nothing at all, annotations are
///    zipped with markers in text order. This is fragile, so the resulting
///    entries are marked [`Confidence::Positional`].
/// 3. **Scattered**: any remaining `number delimiter letter` pattern fills
///    numbers that are still missing.
pub fn parse_key_annotated(text: &str) -> AnswerKey {
    let markers = question_markers(text);
    let annotations = answer_annotations(text);
    let mut key = AnswerKey::new();

    for (label, at) in &annotations {
        let nearest = markers.iter().rev().find(|(_, pos)| pos < at);
        if let Some((number, pos)) = nearest {
            if text[*pos..*at].chars().count() <= ANNOTATION_WINDOW {
                key.insert_missing(
                    number,
                    KeyEntry::new(KeyValue::Label(*label), Confidence::Annotated),
                );
            }
        }
    }

    if key.is_empty() {
        for ((number, _), (label, _)) in markers.iter().zip(&annotations) {
            key.insert_missing(
                number,
                KeyEntry::new(KeyValue::Label(*label), Confidence::Positional),
            );
        }
    }

    for caps in scattered_pair_re().captures_iter(text) {
        let Some(number) = caps.get(1) else {
            continue;
        };
        let Some(label) = caps
            .get(2)
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().chars().next())
            .and_then(Label::from_char)
        else {
            continue;
        };
        key.insert_missing(
            number.as_str(),
            KeyEntry::new(KeyValue::Label(label), Confidence::Scattered),
        );
    }

    key
}

/// Merge keys from several sources; later sources override earlier ones.
pub fn merge_keys<I: IntoIterator<Item = AnswerKey>>(sources: I) -> AnswerKey {
    let mut merged = AnswerKey::new();
    for key in sources {
        merged.merge(key);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_of(key: &AnswerKey, number: &str) -> Option<Label> {
        match key.get(number).map(|e| &e.value) {
            Some(KeyValue::Label(label)) => Some(*label),
            _ => None,
        }
    }

    // ============================================================================
    // parse_key_lines tests
    // ============================================================================

    #[test]
    fn test_lines_all_separators() {
        let key = parse_key_lines("1 A\n2-b\n3:C\n4. d\n5) a\n6 - B");
        assert_eq!(key.len(), 6);
        assert_eq!(label_of(&key, "1"), Some(Label::A));
        assert_eq!(label_of(&key, "2"), Some(Label::B));
        assert_eq!(label_of(&key, "3"), Some(Label::C));
        assert_eq!(label_of(&key, "4"), Some(Label::D));
        assert_eq!(label_of(&key, "5"), Some(Label::A));
        assert_eq!(label_of(&key, "6"), Some(Label::B));
    }

    #[test]
    fn test_lines_digit_labels_normalized() {
        let key = parse_key_lines("10 1\n11-2\n12: 3\n13. 4");
        assert_eq!(label_of(&key, "10"), Some(Label::A));
        assert_eq!(label_of(&key, "11"), Some(Label::B));
        assert_eq!(label_of(&key, "12"), Some(Label::C));
        assert_eq!(label_of(&key, "13"), Some(Label::D));
    }

    #[test]
    fn test_lines_every_number_and_label_pair() {
        for number in [1, 9, 42, 999] {
            for (raw, expected) in [("a", Label::A), ("B", Label::B), ("3", Label::C), ("d", Label::D)] {
                let key = parse_key_lines(&format!("{}-{}", number, raw));
                assert_eq!(label_of(&key, &number.to_string()), Some(expected));
            }
        }
    }

    #[test]
    fn test_lines_raw_text_kept_verbatim() {
        let key = parse_key_lines("7 - Photosynthesis in plants");
        assert_eq!(
            key.get("7").unwrap().value,
            KeyValue::Raw("Photosynthesis in plants".to_string())
        );
    }

    #[test]
    fn test_lines_non_matching_lines_ignored() {
        let key = parse_key_lines("ANSWER KEY\n\n2024 Edition\n1 A\nPage 3\n42");
        assert_eq!(key.len(), 1);
        assert_eq!(label_of(&key, "1"), Some(Label::A));
    }

    #[test]
    fn test_lines_out_of_range_digit_is_raw() {
        let key = parse_key_lines("3 5");
        assert_eq!(key.get("3").unwrap().value, KeyValue::Raw("5".to_string()));
    }

    #[test]
    fn test_lines_later_line_wins() {
        let key = parse_key_lines("1 A\n1 C");
        assert_eq!(label_of(&key, "1"), Some(Label::C));
    }

    #[test]
    fn test_lines_entries_are_explicit() {
        let key = parse_key_lines("1 B");
        assert_eq!(key.get("1").unwrap().confidence, Confidence::Explicit);
    }

    // ============================================================================
    // parse_key_annotated tests
    // ============================================================================

    #[test]
    fn test_annotated_structured_pairs() {
        let text = "1. Explanation of the first item. Answer: B\n2. Another one.\nAns. (c)\n3. Correct answer is d";
        let key = parse_key_annotated(text);
        assert_eq!(label_of(&key, "1"), Some(Label::B));
        assert_eq!(label_of(&key, "2"), Some(Label::C));
        assert_eq!(label_of(&key, "3"), Some(Label::D));
        assert!(key.entries().iter().all(|(_, e)| e.confidence == Confidence::Annotated));
    }

    #[test]
    fn test_annotated_answer_beyond_window_is_not_structured() {
        let filler = "x".repeat(ANNOTATION_WINDOW + 10);
        let text = format!("1. {}\nAnswer: A", filler);
        let key = parse_key_annotated(&text);
        // Falls back to positional pairing.
        assert_eq!(key.get("1").unwrap().confidence, Confidence::Positional);
        assert_eq!(label_of(&key, "1"), Some(Label::A));
    }

    #[test]
    fn test_annotated_positional_fallback_pairs_in_order() {
        let filler = "long discussion ".repeat(10);
        let text = format!(
            "1. {f}\n2. {f}\nSolutions\nAnswer: C\nAnswer: A",
            f = filler
        );
        let key = parse_key_annotated(&text);
        assert_eq!(label_of(&key, "1"), Some(Label::C));
        assert_eq!(label_of(&key, "2"), Some(Label::A));
        assert_eq!(key.low_confidence_numbers(), vec!["1", "2"]);
    }

    #[test]
    fn test_annotated_scattered_pass_fills_only_missing() {
        let text = "1. Item one. Answer: B\nQuick key: 1-D 2-A 3 (c)";
        let key = parse_key_annotated(text);
        assert_eq!(label_of(&key, "1"), Some(Label::B));
        assert_eq!(key.get("1").unwrap().confidence, Confidence::Annotated);
        assert_eq!(label_of(&key, "2"), Some(Label::A));
        assert_eq!(key.get("2").unwrap().confidence, Confidence::Scattered);
        assert_eq!(label_of(&key, "3"), None);
    }

    #[test]
    fn test_annotated_scattered_pass_parenthesized_letter() {
        let key = parse_key_annotated("4) (b)");
        assert_eq!(label_of(&key, "4"), Some(Label::B));
        assert_eq!(key.get("4").unwrap().confidence, Confidence::Scattered);
    }

    #[test]
    fn test_annotated_ignores_answer_keyword_without_letter() {
        let key = parse_key_annotated("Answer Key\nAnswers follow");
        assert!(key.is_empty());
    }

    // ============================================================================
    // parse_key / merge tests
    // ============================================================================

    #[test]
    fn test_auto_detects_annotated_text() {
        let key = parse_key("1. Because reasons. Answer: D", KeyFormat::Auto);
        assert_eq!(label_of(&key, "1"), Some(Label::D));
        assert_eq!(key.get("1").unwrap().confidence, Confidence::Annotated);
    }

    #[test]
    fn test_auto_defaults_to_lines() {
        let key = parse_key("1 B\n2 C", KeyFormat::Auto);
        assert_eq!(label_of(&key, "2"), Some(Label::C));
        assert_eq!(key.get("2").unwrap().confidence, Confidence::Explicit);
    }

    #[test]
    fn test_manual_key_overrides_pdf_key() {
        let pdf = parse_key_lines("1 A\n2 B");
        let manual = parse_key_lines("1 D");
        let merged = merge_keys([pdf, manual]);
        assert_eq!(label_of(&merged, "1"), Some(Label::D));
        assert_eq!(label_of(&merged, "2"), Some(Label::B));
    }

    #[test]
    fn test_key_format_from_str() {
        assert_eq!("Lines".parse::<KeyFormat>(), Ok(KeyFormat::Lines));
        assert_eq!("annotated".parse::<KeyFormat>(), Ok(KeyFormat::Annotated));
        assert!("csv".parse::<KeyFormat>().is_err());
    }
}
