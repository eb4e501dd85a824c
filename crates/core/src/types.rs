use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical option label. Position `i` in a question's option list maps to
/// `Label::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        match self {
            Label::A => 'A',
            Label::B => 'B',
            Label::C => 'C',
            Label::D => 'D',
        }
    }

    /// Parse a single label character.
    ///
    /// Letters `A`-`D` are accepted in either case; digits `1`-`4` map to
    /// `A`-`D` respectively.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' | '1' => Some(Label::A),
            'B' | '2' => Some(Label::B),
            'C' | '3' => Some(Label::C),
            'D' | '4' => Some(Label::D),
            _ => None,
        }
    }

    /// Parse a string that consists of exactly one label character.
    pub fn from_single(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Display label for the option at `index`.
///
/// The first four options use the `A`-`D` convention; anything past that
/// falls back to its 1-based position.
pub fn option_label(index: usize) -> String {
    match Label::from_index(index) {
        Some(label) => label.to_string(),
        None => (index + 1).to_string(),
    }
}

/// Order question numbers numerically when both parse, lexically otherwise.
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// A single multiple-choice question recovered from source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier exactly as it appeared in the source (e.g. `"12"`).
    pub number: String,
    /// Whitespace-normalized question text.
    pub prompt: String,
    /// Option texts in canonical order. Empty when no options were detected.
    pub options: Vec<String>,
}

impl Question {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

/// Value of an answer-key entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValue {
    /// Already a canonical label.
    Label(Label),
    /// Free text to be matched against option texts at scoring time.
    Raw(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Label(label) => write!(f, "{}", label),
            KeyValue::Raw(text) => write!(f, "{}", text),
        }
    }
}

/// How an answer-key entry was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// One `number separator answer` record per line.
    Explicit,
    /// A question marker followed closely by an "answer" annotation.
    Annotated,
    /// Answer annotations paired with question markers by text order.
    Positional,
    /// A bare `number delimiter letter` pattern found anywhere in the text.
    Scattered,
}

impl Confidence {
    pub fn is_low(self) -> bool {
        matches!(self, Confidence::Positional | Confidence::Scattered)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Explicit => write!(f, "explicit"),
            Confidence::Annotated => write!(f, "annotated"),
            Confidence::Positional => write!(f, "positional"),
            Confidence::Scattered => write!(f, "scattered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub value: KeyValue,
    pub confidence: Confidence,
}

impl KeyEntry {
    pub fn new(value: KeyValue, confidence: Confidence) -> Self {
        Self { value, confidence }
    }
}

/// Mapping from question number to its expected answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey(BTreeMap<String, KeyEntry>);

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, number: impl Into<String>, entry: KeyEntry) {
        self.0.insert(number.into(), entry);
    }

    /// Insert only when `number` has no entry yet.
    pub fn insert_missing(&mut self, number: &str, entry: KeyEntry) -> bool {
        if self.0.contains_key(number) {
            return false;
        }
        self.0.insert(number.to_string(), entry);
        true
    }

    pub fn get(&self, number: &str) -> Option<&KeyEntry> {
        self.0.get(number)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.0.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `later` on top of `self`; entries in `later` win.
    pub fn merge(&mut self, later: AnswerKey) {
        self.0.extend(later.0);
    }

    /// Entries ordered by question number.
    pub fn entries(&self) -> Vec<(&str, &KeyEntry)> {
        let mut entries: Vec<(&str, &KeyEntry)> =
            self.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| compare_numbers(a.0, b.0));
        entries
    }

    pub fn low_confidence_numbers(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(_, entry)| entry.confidence.is_low())
            .map(|(number, _)| number.to_string())
            .collect()
    }
}

/// The user's current answer per question number. Only the latest value is
/// kept; blank answers count as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, number: impl Into<String>, answer: impl Into<String>) {
        let number = number.into();
        let answer = answer.into();
        if answer.trim().is_empty() {
            self.0.remove(&number);
        } else {
            self.0.insert(number, answer.trim().to_string());
        }
    }

    pub fn get(&self, number: &str) -> Option<&str> {
        self.0
            .get(number)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Answers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = Answers::new();
        for (number, answer) in iter {
            answers.record(number, answer);
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_char_letters_and_digits() {
        assert_eq!(Label::from_char('a'), Some(Label::A));
        assert_eq!(Label::from_char('D'), Some(Label::D));
        assert_eq!(Label::from_char('2'), Some(Label::B));
        assert_eq!(Label::from_char('4'), Some(Label::D));
        assert_eq!(Label::from_char('5'), None);
        assert_eq!(Label::from_char('E'), None);
    }

    #[test]
    fn test_label_from_single_rejects_longer_strings() {
        assert_eq!(Label::from_single("c"), Some(Label::C));
        assert_eq!(Label::from_single("AB"), None);
        assert_eq!(Label::from_single(""), None);
    }

    #[test]
    fn test_option_label_falls_back_to_numbers() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(3), "D");
        assert_eq!(option_label(4), "5");
    }

    #[test]
    fn test_compare_numbers_numeric_order() {
        let mut numbers = vec!["10", "2", "1", "x"];
        numbers.sort_by(|a, b| compare_numbers(a, b));
        assert_eq!(numbers, vec!["1", "2", "10", "x"]);
    }

    #[test]
    fn test_answer_key_merge_later_wins() {
        let mut pdf = AnswerKey::new();
        pdf.insert("1", KeyEntry::new(KeyValue::Label(Label::A), Confidence::Scattered));
        pdf.insert("2", KeyEntry::new(KeyValue::Label(Label::B), Confidence::Explicit));

        let mut manual = AnswerKey::new();
        manual.insert("1", KeyEntry::new(KeyValue::Label(Label::C), Confidence::Explicit));

        pdf.merge(manual);
        assert_eq!(pdf.get("1").unwrap().value, KeyValue::Label(Label::C));
        assert_eq!(pdf.get("1").unwrap().confidence, Confidence::Explicit);
        assert_eq!(pdf.get("2").unwrap().value, KeyValue::Label(Label::B));
    }

    #[test]
    fn test_answer_key_entries_sorted_numerically() {
        let mut key = AnswerKey::new();
        for n in ["12", "3", "1"] {
            key.insert(n, KeyEntry::new(KeyValue::Label(Label::A), Confidence::Explicit));
        }
        let numbers: Vec<&str> = key.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec!["1", "3", "12"]);
    }

    #[test]
    fn test_answers_blank_removes_entry() {
        let mut answers = Answers::new();
        answers.record("1", "B");
        answers.record("1", "  ");
        assert_eq!(answers.get("1"), None);
        assert!(answers.is_empty());
    }

    #[test]
    fn test_answers_keep_latest_value() {
        let mut answers: Answers = [("1", "A")].into_iter().collect();
        answers.record("1", "C");
        assert_eq!(answers.get("1"), Some("C"));
    }
}
