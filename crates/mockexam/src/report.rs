use std::path::{Path, PathBuf};

use colored::Colorize;
use mockexam_core::report::{
    default_report_name, detail_line, format_score, ReportDocument, ReportLayout,
};
use mockexam_core::score::{Outcome, ScoreReport};

use crate::prelude::{println, *};

pub fn print_score(report: &ScoreReport) {
    for result in &report.details {
        let line = detail_line(result);
        match result.outcome {
            Outcome::Correct => println!("{}", line.green()),
            Outcome::Incorrect => println!("{}", line.red()),
            Outcome::Unanswered | Outcome::Unresolved => println!("{}", line.bright_black()),
        }
    }
    println!();
    println!(
        "{} {} | Correct: {} | Incorrect: {} | Unanswered: {}",
        "Score:".bold(),
        format_score(report.total).bold(),
        report.correct.to_string().green(),
        report.incorrect.to_string().red(),
        report.count(Outcome::Unanswered)
    );
}

/// Write the paginated report as text and return where it went.
pub fn write_report(
    path: Option<&Path>,
    exam_title: &str,
    student: Option<&str>,
    report: &ScoreReport,
) -> Result<PathBuf> {
    let document = ReportDocument::build(exam_title, student, report, &ReportLayout::A4);
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_report_name(exam_title)));

    std::fs::write(&path, document.render_text())
        .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
    log::info!("report written to {} ({} pages)", path.display(), document.pages.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockexam_core::score::QuestionResult;
    use mockexam_core::types::Label;

    fn report() -> ScoreReport {
        ScoreReport {
            total: 1.0,
            correct: 1,
            incorrect: 0,
            details: vec![QuestionResult {
                number: "1".to_string(),
                correct: Some(Label::B),
                user: Some("B".to_string()),
                is_correct: true,
                outcome: Outcome::Correct,
            }],
        }
    }

    #[test]
    fn test_write_report_to_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let written = write_report(Some(&path), "Mock Exam", Some("Asha"), &report()).unwrap();
        assert_eq!(written, path);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Exam: Mock Exam\nStudent: Asha\nScore: 1\nQ1: your=B correct=B ✔\n"
        );
    }
}
