//! Positioned text extraction and line assembly.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]  ->  page / region text
//!   (per page)      extract         group_spans     lines_to_text
//! ```
//!
//! Every function here is a pure transformation; the only I/O goes through
//! the [`PdfBackend`] supplied by the caller.

use super::backend::{get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue};
use crate::PdfError;

/// A run of text at a position in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

/// Spans sharing (approximately) the same baseline, left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Spans whose baselines differ by less than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Glyph width as a fraction of font size when no metrics are available.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap (in points) between adjacent spans before a space is inserted.
const MIN_WORD_GAP: f32 = 1.5;

/// Returns `true` for characters of scripts written without inter-word
/// spaces (CJK, kana, Hangul, Thai and neighbours).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0xF900..=0xFAFF
            | 0x3040..=0x30FF
            | 0x31F0..=0x31FF
            | 0xAC00..=0xD7AF
            | 0x1100..=0x11FF
            | 0x3130..=0x318F
            | 0x3000..=0x303F
            | 0xFF00..=0xFFEF
            | 0x0E00..=0x0EFF
            | 0x1000..=0x109F
            | 0x1780..=0x17FF
            | 0x0F00..=0x0FFF
    )
}

// ---------------------------------------------------------------------------
// Text state machine
// ---------------------------------------------------------------------------

/// Identity text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Horizontal scaling (Tz / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    /// Move past `text` and return the horizontal displacement.
    fn advance_after_show(&mut self, text: &str) -> f32 {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.char_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
        dx
    }

    fn span(&self, text: String) -> TextSpan {
        let width = text.chars().count() as f32 * self.char_width();
        TextSpan {
            text,
            x: self.x(),
            y: self.y(),
            width,
            font_size: self.effective_font_size(),
        }
    }
}

fn number(operands: &[PdfValue], index: usize) -> Option<f32> {
    operands.get(index).and_then(get_number_from_value)
}

fn decode_string(val: &PdfValue, backend: &dyn PdfBackend, page: PageId, font_key: &[u8]) -> String {
    match val {
        PdfValue::Str(bytes) => backend.decode_text(page, font_key, bytes),
        _ => String::new(),
    }
}

/// Walk one page's content stream and collect its [`TextSpan`]s.
///
/// Handles the text object, positioning, spacing and showing operators
/// (`BT Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ ' "`); everything else is
/// ignored.
pub fn extract_page_spans(backend: &dyn PdfBackend, page: PageId) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts: Vec<BackendFontInfo> = backend.page_fonts(page).unwrap_or_default();

    let mut state = TextState::default();
    let mut spans = Vec::new();

    for op in &ops {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => {
                let key = match operands.first() {
                    Some(PdfValue::Name(n)) => n.clone(),
                    _ => continue,
                };
                if !fonts.iter().any(|f| f.name == key) {
                    log::debug!("font {} not in page resources", String::from_utf8_lossy(&key));
                }
                state.font_key = key;
                state.font_size = number(operands, 1).unwrap_or(0.0);
            }
            "Tm" => {
                let values: Vec<f32> = operands.iter().filter_map(get_number_from_value).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    state.text_matrix = [a, b, c, d, e, f];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => state.leading = number(operands, 0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number(operands, 0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number(operands, 0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(v) = number(operands, 0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => state.text_rise = number(operands, 0).unwrap_or(state.text_rise),
            "Tj" => {
                if let Some(first) = operands.first() {
                    show_string(first, backend, page, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    show_array(arr, backend, page, &mut state, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = operands.first() {
                    show_string(first, backend, page, &mut state, &mut spans);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    state.word_spacing = number(operands, 0).unwrap_or(state.word_spacing);
                    state.char_spacing = number(operands, 1).unwrap_or(state.char_spacing);
                    state.next_line();
                    show_string(&operands[2], backend, page, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode_string(operand, backend, page, &state.font_key);
    if text.is_empty() {
        return;
    }
    spans.push(state.span(text.clone()));
    state.advance_after_show(&text);
}

/// `TJ`: strings interleaved with kerning adjustments in thousandths of a
/// text-space unit. A large negative adjustment reads as a word gap.
fn show_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut start: Option<TextState> = None;

    for elem in arr {
        if let PdfValue::Str(_) = elem {
            let fragment = decode_string(elem, backend, page, &state.font_key);
            if start.is_none() {
                start = Some(state.clone());
            }
            buf.push_str(&fragment);
            state.advance_after_show(&fragment);
        } else if let Some(adj) = get_number_from_value(elem) {
            let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.char_width() * 0.3 && !buf.is_empty() {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    let text = buf.trim_end();
    if let Some(origin) = start.filter(|_| !text.is_empty()) {
        spans.push(origin.span(text.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Line assembly
// ---------------------------------------------------------------------------

/// Group spans into lines, top of the page first.
///
/// Spans within [`Y_TOLERANCE`] of the line's first baseline join it. Within
/// a line, spans are ordered by X and merged, inserting a space across gaps
/// wider than [`MIN_WORD_GAP`] unless both sides are spaceless-script text.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();

    for span in spans {
        if let Some(first) = current.first() {
            if (span.y - first.y).abs() > Y_TOLERANCE {
                lines.push(assemble_line(std::mem::take(&mut current)));
            }
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            let same_size = (prev.font_size - span.font_size).abs() < 0.5;

            if same_size && gap > -prev.font_size && gap < prev.font_size * 2.0 {
                if gap >= MIN_WORD_GAP && !boundary_is_spaceless(prev, &span) {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    let y = merged.first().map(|s| s.y).unwrap_or(0.0);
    TextLine { spans: merged, y }
}

fn boundary_is_spaceless(prev: &TextSpan, next: &TextSpan) -> bool {
    match (prev.text.chars().next_back(), next.text.chars().next()) {
        (Some(l), Some(f)) => is_spaceless_script_char(l) && is_spaceless_script_char(f),
        _ => false,
    }
}

/// Keep spans whose origin lies inside `[x0, x1) x [y0, y1]`.
pub fn spans_in_region(spans: &[TextSpan], region: [f32; 4]) -> Vec<TextSpan> {
    let [x0, y0, x1, y1] = region;
    spans
        .iter()
        .filter(|s| s.x >= x0 && s.x < x1 && s.y >= y0 && s.y <= y1)
        .cloned()
        .collect()
}

/// One line of text per [`TextLine`].
pub fn lines_to_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(TextLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}
