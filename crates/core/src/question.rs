//! Question parsing.
//!
//! A text block is split into candidate segments at question markers
//! (`12.`, `Q12)`, `Question 12.`), then each segment body is handed to an
//! ordered list of [`OptionStrategy`] values. The first strategy that
//! recovers at least [`MIN_OPTIONS`] options wins; when none does, the whole
//! body becomes a free-text question.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Label, Question};

/// Fewer options than this means "no options detected".
pub const MIN_OPTIONS: usize = 2;

/// Strategies in the order they are tried.
pub const STRATEGIES: [OptionStrategy; 2] = [OptionStrategy::LineStart, OptionStrategy::Inline];

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[ \t]*((?i:q(?:uestion|ues|n)?)\.?[ \t]*|प्रश्न[ \t]*|#[ \t]*)?(\d{1,3})[.)]",
        )
        .unwrap()
    })
}

fn option_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*\(?([A-Da-d1-4])[.)](?:[ \t]+(.*)|[ \t]*$)").unwrap())
}

fn inline_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)(\(?([A-Da-d])[.)])").unwrap())
}

fn extra_option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*\((\d{1,2})\)(?:[ \t]+(.*)|[ \t]*$)").unwrap())
}

/// A question marker found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Marker<'a> {
    number: &'a str,
    prefixed: bool,
    rest: &'a str,
}

fn match_marker(line: &str) -> Option<Marker<'_>> {
    let caps = marker_re().captures(line)?;
    let whole = caps.get(0)?;
    let rest = &line[whole.end()..];
    // "2.5 kg" is a number, not a marker.
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(Marker {
        number: caps.get(2)?.as_str(),
        prefixed: caps.get(1).is_some(),
        rest,
    })
}

/// Parse an option-start line into its label and text.
fn match_option_start(line: &str) -> Option<(Label, &str)> {
    let caps = option_start_re().captures(line)?;
    let label = caps
        .get(1)
        .and_then(|m| m.as_str().chars().next())
        .and_then(Label::from_char)?;
    let text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((label, text))
}

/// Like [`match_option_start`], but also accepts the `(5)`, `(6)`, ...
/// labels used for options past `D`. Those come back without a label.
fn match_option_line(line: &str) -> Option<(Option<Label>, &str)> {
    if let Some((label, text)) = match_option_start(line) {
        return Some((Some(label), text));
    }
    let caps = extra_option_re().captures(line)?;
    let n: usize = caps.get(1)?.as_str().parse().ok()?;
    (n > Label::ALL.len()).then(|| (None, caps.get(2).map(|m| m.as_str()).unwrap_or("")))
}

fn is_letter_option(line: &str) -> bool {
    match_option_start(line).is_some()
        && line
            .trim_start()
            .trim_start_matches('(')
            .starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Collapse all whitespace runs to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

struct Segment<'a> {
    number: &'a str,
    lines: Vec<&'a str>,
    letter_options: usize,
    numeric_options: usize,
}

impl<'a> Segment<'a> {
    fn new(marker: Marker<'a>) -> Self {
        Self {
            number: marker.number,
            lines: vec![marker.rest],
            letter_options: 0,
            numeric_options: 0,
        }
    }

    /// A bare `1.`-`4.` line that continues this segment's numeric option
    /// run (`1.` first, then `2.`, ...) is an option, not a new question.
    ///
    /// `following` holds the lines up to the next marker. When the run is
    /// already complete, the line's number is the next question number and
    /// lettered options follow it, the line starts a new question.
    fn continues_numeric_options(
        &self,
        marker: &Marker<'_>,
        line: &str,
        following: &[&str],
    ) -> bool {
        if marker.prefixed || self.letter_options > 0 {
            return false;
        }
        let Ok(n) = marker.number.parse::<usize>() else {
            return false;
        };
        let extends_run = (1..=4).contains(&n)
            && n == self.numeric_options + 1
            && match_option_start(line).is_some();
        if !extends_run {
            return false;
        }
        let next_question = self.number.parse::<usize>().is_ok_and(|own| n == own + 1);
        let starts_question = next_question
            && self.numeric_options >= MIN_OPTIONS
            && following.iter().any(|l| is_letter_option(l));
        !starts_question
    }

    fn push(&mut self, line: &'a str) {
        if match_option_start(line).is_some() {
            let trimmed = line.trim_start().trim_start_matches('(');
            if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
                self.numeric_options += 1;
            } else {
                self.letter_options += 1;
            }
        }
        self.lines.push(line);
    }

    fn body(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

/// Split a block into `(number, body)` pairs in source order. Text before
/// the first marker is dropped.
fn split_segments(block: &str) -> Vec<(String, String)> {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    let lines: Vec<&str> = block.lines().collect();

    for (i, &line) in lines.iter().enumerate() {
        let Some(marker) = match_marker(line) else {
            if let Some(current) = segments.last_mut() {
                current.push(line);
            }
            continue;
        };

        let rest = &lines[i + 1..];
        let following = &rest[..rest
            .iter()
            .position(|l| match_marker(l).is_some())
            .unwrap_or(rest.len())];
        let continues = segments
            .last()
            .is_some_and(|current| current.continues_numeric_options(&marker, line, following));
        match segments.last_mut() {
            Some(current) if continues => current.push(line),
            _ => segments.push(Segment::new(marker)),
        }
    }

    segments
        .iter()
        .map(|s| (s.number.to_string(), s.body()))
        .collect()
}

/// An option together with the label it carried in the source, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledOption {
    pub label: Option<Label>,
    pub text: String,
}

/// Prompt and options recovered by one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub prompt: String,
    pub options: Vec<LabeledOption>,
}

impl Extraction {
    /// Order options A-D by their recovered labels. Unlabeled options go
    /// last, keeping the order they were encountered in.
    fn into_sorted(mut self) -> Self {
        self.options
            .sort_by_key(|o| o.label.map(Label::index).unwrap_or(Label::ALL.len()));
        self
    }
}

/// A named way of finding options inside a question body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStrategy {
    /// Options start on their own lines (`A. text`, `(b) text`, `3) text`).
    LineStart,
    /// Option markers appear anywhere in the body (`... A) x B) y`).
    Inline,
}

impl OptionStrategy {
    pub fn name(self) -> &'static str {
        match self {
            OptionStrategy::LineStart => "line-start",
            OptionStrategy::Inline => "inline",
        }
    }

    /// Run the strategy; `None` unless at least [`MIN_OPTIONS`] options were
    /// recovered.
    pub fn extract(self, body: &str) -> Option<Extraction> {
        let extraction = match self {
            OptionStrategy::LineStart => extract_line_start(body),
            OptionStrategy::Inline => extract_inline(body),
        }?;
        (extraction.options.len() >= MIN_OPTIONS).then(|| extraction.into_sorted())
    }
}

fn extract_line_start(body: &str) -> Option<Extraction> {
    let lines: Vec<&str> = body.lines().collect();
    let first = lines
        .iter()
        .position(|line| match_option_start(line).is_some())?;

    let prompt = normalize_whitespace(&lines[..first].join(" "));
    let mut options: Vec<LabeledOption> = Vec::new();

    for line in &lines[first..] {
        if let Some((label, text)) = match_option_line(line) {
            options.push(LabeledOption {
                label,
                text: normalize_whitespace(text),
            });
        } else if let Some(last) = options.last_mut() {
            let continuation = normalize_whitespace(line);
            if !continuation.is_empty() {
                if !last.text.is_empty() {
                    last.text.push(' ');
                }
                last.text.push_str(&continuation);
            }
        }
    }

    Some(Extraction { prompt, options })
}

fn extract_inline(body: &str) -> Option<Extraction> {
    // First occurrence of each label: (label, marker start, marker end).
    let mut firsts: Vec<(Label, usize, usize)> = Vec::new();
    for caps in inline_marker_re().captures_iter(body) {
        let (Some(marker), Some(letter)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(label) = letter.as_str().chars().next().and_then(Label::from_char) else {
            continue;
        };
        if firsts.iter().all(|(seen, _, _)| *seen != label) {
            firsts.push((label, marker.start(), marker.end()));
        }
    }

    if firsts.is_empty() {
        return None;
    }
    firsts.sort_by_key(|(_, start, _)| *start);

    let prompt = normalize_whitespace(&body[..firsts[0].1]);
    let options = firsts
        .iter()
        .enumerate()
        .map(|(i, (label, _, end))| {
            let stop = firsts.get(i + 1).map(|(_, start, _)| *start).unwrap_or(body.len());
            LabeledOption {
                label: Some(*label),
                text: normalize_whitespace(&body[*end..stop]),
            }
        })
        .collect();

    Some(Extraction { prompt, options })
}

/// Build a question from a segment body, trying each strategy in order.
pub fn parse_body(number: &str, body: &str) -> Question {
    let extraction = STRATEGIES
        .iter()
        .find_map(|strategy| strategy.extract(body));

    match extraction {
        Some(extraction) => Question {
            number: number.to_string(),
            prompt: extraction.prompt,
            options: extraction.options.into_iter().map(|o| o.text).collect(),
        },
        None => Question {
            number: number.to_string(),
            prompt: normalize_whitespace(body),
            options: Vec::new(),
        },
    }
}

/// Parse every question in a single text block, in source order.
pub fn parse_questions(block: &str) -> Vec<Question> {
    let block = normalize_line_endings(block);
    split_segments(&block)
        .into_iter()
        .map(|(number, body)| parse_body(&number, &body))
        .collect()
}

/// Parse several blocks independently and concatenate the results.
pub fn parse_blocks<S: AsRef<str>>(blocks: &[S]) -> Vec<Question> {
    blocks
        .iter()
        .flat_map(|block| parse_questions(block.as_ref()))
        .collect()
}

/// Render a question back into the line-based source format. Options past
/// `D` are written as `(5) text`, which never reads as a question marker.
pub fn serialize_question(question: &Question) -> String {
    let mut out = format!("{}. {}", question.number, question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        out.push('\n');
        match Label::from_index(i) {
            Some(label) => out.push_str(&format!("{}. ", label)),
            None => out.push_str(&format!("({}) ", i + 1)),
        }
        out.push_str(option);
    }
    out
}
