//! Score report layout.
//!
//! Lines are positioned with A4 page geometry so that a renderer can either
//! draw them at their `y` coordinate or emit them page by page as text.

use serde::{Deserialize, Serialize};

use crate::score::{QuestionResult, ScoreReport};

pub const DEFAULT_STUDENT: &str = "Student";

const CHECK: char = '✔';
const CROSS: char = '✖';

/// Vertical layout of a report, in points from the bottom of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportLayout {
    pub page_height: f32,
    /// Distance from the top edge to the first header line.
    pub header_offset: f32,
    pub header_step: f32,
    /// Distance from the top edge to the first detail line on page one.
    pub details_offset: f32,
    /// Distance from the top edge to the first line on continuation pages.
    pub continuation_offset: f32,
    pub line_step: f32,
    /// Lines are never placed below this height.
    pub bottom_margin: f32,
}

impl ReportLayout {
    pub const A4: ReportLayout = ReportLayout {
        page_height: 841.89,
        header_offset: 40.0,
        header_step: 20.0,
        details_offset: 110.0,
        continuation_offset: 40.0,
        line_step: 18.0,
        bottom_margin: 60.0,
    };
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedLine {
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    pub lines: Vec<PlacedLine>,
}

/// Format a score without trailing zeros (`1.34`, `2`, `-0.5`).
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.2}", score);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// `Q{number}: your={user} correct={correct} ✔|✖`, with `-` for missing values.
pub fn detail_line(result: &QuestionResult) -> String {
    format!(
        "Q{}: your={} correct={} {}",
        result.number,
        result.user.as_deref().unwrap_or("-"),
        result
            .correct
            .map(|label| label.to_string())
            .unwrap_or_else(|| "-".to_string()),
        if result.is_correct { CHECK } else { CROSS }
    )
}

/// File name for a report, derived from the exam title.
pub fn default_report_name(exam_title: &str) -> String {
    format!("{}_result.txt", exam_title.trim().replace(' ', "_"))
}

/// Place `header` and `details` on pages.
///
/// A new page is started whenever the next detail line would fall below the
/// bottom margin. No trailing empty page is produced.
pub fn paginate(header: &[String], details: &[String], layout: &ReportLayout) -> Vec<ReportPage> {
    let top = layout.page_height;
    let mut pages = Vec::new();
    let mut page = ReportPage::default();

    for (i, text) in header.iter().enumerate() {
        page.lines.push(PlacedLine {
            y: top - layout.header_offset - i as f32 * layout.header_step,
            text: text.clone(),
        });
    }

    let mut y = top - layout.details_offset;
    for text in details {
        if y < layout.bottom_margin {
            pages.push(std::mem::take(&mut page));
            y = top - layout.continuation_offset;
        }
        page.lines.push(PlacedLine {
            y,
            text: text.clone(),
        });
        y -= layout.line_step;
    }

    if !page.lines.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub exam_title: String,
    pub student: String,
    pub score: f64,
    pub pages: Vec<ReportPage>,
}

impl ReportDocument {
    pub fn build(
        exam_title: &str,
        student: Option<&str>,
        report: &ScoreReport,
        layout: &ReportLayout,
    ) -> Self {
        let student = student
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STUDENT);
        let header = vec![
            format!("Exam: {}", exam_title),
            format!("Student: {}", student),
            format!("Score: {}", format_score(report.total)),
        ];
        let details: Vec<String> = report.details.iter().map(detail_line).collect();

        Self {
            exam_title: exam_title.to_string(),
            student: student.to_string(),
            score: report.total,
            pages: paginate(&header, &details, layout),
        }
    }

    /// Plain-text rendering: one line per placed line, pages separated by a
    /// form feed.
    pub fn render_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| {
                let mut text = String::new();
                for line in &page.lines {
                    text.push_str(&line.text);
                    text.push('\n');
                }
                text
            })
            .collect::<Vec<_>>()
            .join("\u{000C}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Outcome;
    use crate::types::Label;

    fn result(number: usize, user: Option<&str>, correct: Option<Label>) -> QuestionResult {
        let is_correct = matches!((user, correct), (Some(u), Some(c)) if u == c.to_string());
        QuestionResult {
            number: number.to_string(),
            correct,
            user: user.map(str::to_string),
            is_correct,
            outcome: if is_correct {
                Outcome::Correct
            } else {
                Outcome::Incorrect
            },
        }
    }

    fn report_with(n: usize) -> ScoreReport {
        ScoreReport {
            total: 1.34,
            correct: 1,
            incorrect: 1,
            details: (1..=n).map(|i| result(i, Some("A"), Some(Label::A))).collect(),
        }
    }

    #[test]
    fn test_detail_line_format() {
        assert_eq!(
            detail_line(&result(1, Some("B"), Some(Label::B))),
            "Q1: your=B correct=B ✔"
        );
        assert_eq!(
            detail_line(&result(2, Some("A"), Some(Label::C))),
            "Q2: your=A correct=C ✖"
        );
        assert_eq!(detail_line(&result(3, None, None)), "Q3: your=- correct=- ✖");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(1.34), "1.34");
        assert_eq!(format_score(2.0), "2");
        assert_eq!(format_score(-0.5), "-0.5");
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(-0.001), "0");
    }

    #[test]
    fn test_default_report_name() {
        assert_eq!(default_report_name("Mock Exam"), "Mock_Exam_result.txt");
    }

    #[test]
    fn test_paginate_first_page_capacity() {
        let layout = ReportLayout::A4;
        // First detail at 731.89, step 18: lines at y >= 60 fit on page one.
        let capacity = ((layout.page_height - layout.details_offset - layout.bottom_margin)
            / layout.line_step)
            .floor() as usize
            + 1;
        let details: Vec<String> = (0..capacity).map(|i| format!("line {}", i)).collect();

        let pages = paginate(&[], &details, &layout);
        assert_eq!(pages.len(), 1);

        let details: Vec<String> = (0..=capacity).map(|i| format!("line {}", i)).collect();
        let pages = paginate(&[], &details, &layout);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines.len(), 1);
        assert_eq!(pages[1].lines[0].y, layout.page_height - layout.continuation_offset);
    }

    #[test]
    fn test_paginate_never_places_below_margin() {
        let details: Vec<String> = (0..200).map(|i| format!("Q{}", i)).collect();
        let pages = paginate(&[], &details, &ReportLayout::A4);
        let placed: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(placed, 200);
        assert!(pages
            .iter()
            .flat_map(|p| &p.lines)
            .all(|line| line.y >= ReportLayout::A4.bottom_margin));
        assert!(pages.iter().all(|p| !p.lines.is_empty()));
    }

    #[test]
    fn test_header_lines_positions() {
        let doc = ReportDocument::build("Mock Exam", None, &report_with(0), &ReportLayout::A4);
        let lines = &doc.pages[0].lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "Exam: Mock Exam");
        assert_eq!(lines[1].text, "Student: Student");
        assert_eq!(lines[2].text, "Score: 1.34");
        assert_eq!(lines[0].y, 841.89 - 40.0);
        assert_eq!(lines[2].y, 841.89 - 40.0 - 2.0 * 20.0);
    }

    #[test]
    fn test_render_text_separates_pages_with_form_feed() {
        let doc = ReportDocument::build(
            "Final",
            Some("Asha"),
            &report_with(60),
            &ReportLayout::A4,
        );
        let text = doc.render_text();
        assert_eq!(text.matches('\u{000C}').count(), doc.pages.len() - 1);
        assert!(text.starts_with("Exam: Final\nStudent: Asha\nScore: 1.34\nQ1: your=A correct=A ✔\n"));
        assert!(text.contains("Q60: your=A correct=A ✔"));
    }
}
