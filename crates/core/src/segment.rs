//! Language and column segmentation.
//!
//! Turns a document's pages into the ordered list of text blocks the question
//! parser consumes. Block boundaries are also question-group boundaries: no
//! question is assumed to span two blocks.

use serde::{Deserialize, Serialize};

use crate::config::ExamConfig;

/// Default share of secondary-script characters that marks a block as being
/// in the secondary language.
pub const DEFAULT_SECONDARY_THRESHOLD: f32 = 0.20;

/// Axis-aligned page region in PDF user-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Split at the horizontal midpoint into `(left, right)` halves.
    pub fn split_columns(&self) -> (Rect, Rect) {
        let mid = self.x0 + self.width() / 2.0;
        (
            Rect::new(self.x0, self.y0, mid, self.y1),
            Rect::new(mid, self.y0, self.x1, self.y1),
        )
    }
}

/// Per-page access to a document's text layer.
///
/// Implementations must never fail: a page without a text layer yields an
/// empty string.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_text(&self, index: usize) -> String;

    /// Geometric bounds of the page, when the source knows them.
    fn page_bounds(&self, index: usize) -> Option<Rect>;

    /// Text of the part of the page inside `region`.
    fn region_text(&self, index: usize, region: Rect) -> String;
}

/// Plain page texts without geometry (pasted text, fixtures).
impl PageSource for Vec<String> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_text(&self, index: usize) -> String {
        self.get(index).cloned().unwrap_or_default()
    }

    fn page_bounds(&self, _index: usize) -> Option<Rect> {
        None
    }

    fn region_text(&self, index: usize, _region: Rect) -> String {
        self.page_text(index)
    }
}

/// Non-Latin script used to recognize secondary-language text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    #[default]
    Devanagari,
    Bengali,
    Tamil,
    Arabic,
    Cyrillic,
    Greek,
    Han,
    Custom {
        start: u32,
        end: u32,
    },
}

impl Script {
    /// Inclusive code-point range covered by the script.
    pub fn range(&self) -> (u32, u32) {
        match self {
            Script::Devanagari => (0x0900, 0x097F),
            Script::Bengali => (0x0980, 0x09FF),
            Script::Tamil => (0x0B80, 0x0BFF),
            Script::Arabic => (0x0600, 0x06FF),
            Script::Cyrillic => (0x0400, 0x04FF),
            Script::Greek => (0x0370, 0x03FF),
            Script::Han => (0x4E00, 0x9FFF),
            Script::Custom { start, end } => (*start, *end),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        let (start, end) = self.range();
        (start..=end).contains(&(c as u32))
    }
}

/// Share of non-whitespace characters in `text` that belong to `script`.
pub fn script_fraction(text: &str, script: Script) -> f32 {
    let mut total = 0usize;
    let mut hits = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if script.contains(c) {
            hits += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    hits as f32 / total as f32
}

pub fn is_secondary_language(text: &str, script: Script, threshold: f32) -> bool {
    !text.trim().is_empty() && script_fraction(text, script) >= threshold
}

/// Page indices kept from a strictly alternating bilingual document.
///
/// Every second page is taken, starting at page 1 when the first page is in
/// the secondary language and at page 0 otherwise.
pub fn interleaved_pages(page_count: usize, first_is_secondary: bool) -> Vec<usize> {
    let offset = usize::from(first_is_secondary);
    (offset..page_count).step_by(2).collect()
}

/// Left-then-right column texts of a page, skipping empty halves.
///
/// Falls back to the whole page when the source has no geometry.
pub fn split_columns(source: &dyn PageSource, index: usize) -> Vec<String> {
    let halves = match source.page_bounds(index) {
        Some(bounds) => {
            let (left, right) = bounds.split_columns();
            vec![
                source.region_text(index, left),
                source.region_text(index, right),
            ]
        }
        None => vec![source.page_text(index)],
    };

    halves
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Segmentation settings, usually derived from [`ExamConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    pub alternating_pages: bool,
    pub first_page_is_secondary: bool,
    pub filter_secondary_language: bool,
    pub two_column: bool,
    pub script: Script,
    pub threshold: f32,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            alternating_pages: false,
            first_page_is_secondary: false,
            filter_secondary_language: false,
            two_column: false,
            script: Script::default(),
            threshold: DEFAULT_SECONDARY_THRESHOLD,
        }
    }
}

impl From<&ExamConfig> for SegmentOptions {
    fn from(config: &ExamConfig) -> Self {
        Self {
            alternating_pages: config.alternating_pages,
            first_page_is_secondary: config.first_page_is_secondary_language,
            filter_secondary_language: config.filter_secondary_language,
            two_column: config.two_column,
            script: config.secondary_script,
            threshold: config.secondary_threshold,
        }
    }
}

/// Produce the ordered text blocks to parse from a document.
///
/// Pages are first thinned by interleaving, then split into columns, and
/// finally blocks in the secondary language are dropped.
pub fn segment_document(source: &dyn PageSource, options: &SegmentOptions) -> Vec<String> {
    let pages: Vec<usize> = if options.alternating_pages {
        interleaved_pages(source.page_count(), options.first_page_is_secondary)
    } else {
        (0..source.page_count()).collect()
    };

    let mut blocks = Vec::new();
    for index in pages {
        let page_blocks = if options.two_column {
            split_columns(source, index)
        } else {
            let text = source.page_text(index);
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        };

        blocks.extend(page_blocks.into_iter().filter(|block| {
            !(options.filter_secondary_language
                && is_secondary_language(block, options.script, options.threshold))
        }));
    }

    blocks
}
