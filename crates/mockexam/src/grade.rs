use std::path::PathBuf;

use mockexam_core::answer_key::{parse_key_lines, KeyFormat};
use mockexam_core::notice::Notice;
use mockexam_core::score::{evaluate, ScoreReport};
use mockexam_core::session::{self, Session};
use mockexam_core::types::Answers;

use crate::config::ConfigArgs;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Question PDF
    #[arg(long)]
    questions: PathBuf,

    /// Answer sheet, one `number answer` per line (`-` for stdin)
    #[arg(long)]
    answers: PathBuf,

    /// Answer-key PDF
    #[arg(long)]
    key_pdf: Option<PathBuf>,

    /// Answer-key text file; overrides the key PDF
    #[arg(long)]
    key_text: Option<PathBuf>,

    /// How to read the key PDF: auto, lines or annotated
    #[arg(long, default_value = "auto")]
    format: KeyFormat,

    /// Student name shown on the report
    #[arg(long, env = "MOCKEXAM_STUDENT")]
    student: Option<String>,

    /// Report file (defaults to `<title>_result.txt`)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Output the score as JSON
    #[arg(long)]
    json: bool,

    #[clap(flatten)]
    config: ConfigArgs,
}

/// Read an answer sheet in the same `number answer` form as a key file.
pub fn parse_answer_sheet(text: &str) -> Answers {
    parse_key_lines(text)
        .entries()
        .into_iter()
        .map(|(number, entry)| (number.to_string(), entry.value.to_string()))
        .collect()
}

/// Score an answer sheet against a question document and key, no timer.
pub fn grade(session: &Session, answers: &Answers) -> (ScoreReport, Vec<Notice>) {
    let key = session.key();
    let report = evaluate(
        &session.questions,
        answers,
        &key,
        &session.config.marking_scheme(),
    );
    (report, session::key_notices(session))
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref(), &options.config)?;
    let mut notices = Vec::new();

    let (source, unreadable) = crate::source::open_pdf(&options.questions);
    notices.extend(unreadable);
    let (mut current, parsed) = session::load_questions(Session::new(config), source.as_ref(), false);
    notices.extend(parsed);

    if let Some(key_pdf) = options.key_pdf.as_deref() {
        let (source, unreadable) = crate::source::open_pdf(key_pdf);
        notices.extend(unreadable);
        let (next, _) = session::load_key_document(current, source.as_ref(), options.format, false);
        current = next;
    }
    if let Some(key_text) = options.key_text.as_deref() {
        current = session::apply_manual_key(current, &crate::source::read_text(key_text)?);
    }

    let answers = parse_answer_sheet(&crate::source::read_text(&options.answers)?);
    log::info!("{} answers read from {}", answers.len(), options.answers.display());

    let (report, key_notices) = grade(&current, &answers);
    notices.extend(key_notices);
    print_notices(&notices);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        crate::report::print_score(&report);
    }

    let written = crate::report::write_report(
        options.report.as_deref(),
        &current.config.exam_title,
        options.student.as_deref(),
        &report,
    )?;
    eprintln!("Report: {}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockexam_core::config::ExamConfig;

    fn loaded(config: ExamConfig) -> Session {
        let pages = vec![
            "1. Capital of France?\nA. Berlin\nB. Paris\nC. Rome\n\
             2. Square of three?\nA. 6\nB. 9\nC. 12\n\
             3. Chemical symbol of gold?\nA. Ag\nB. Au"
                .to_string(),
        ];
        let (current, _) = session::load_questions(Session::new(config), &pages, false);
        current
    }

    #[test]
    fn test_parse_answer_sheet() {
        let answers = parse_answer_sheet("1 b\n2. C\nnot an answer\n3 Au\n");
        assert_eq!(answers.get("1"), Some("B"));
        assert_eq!(answers.get("2"), Some("C"));
        assert_eq!(answers.get("3"), Some("Au"));
        assert_eq!(answers.len(), 3);
    }

    #[test]
    fn test_grade_with_negative_marking() {
        let config = ExamConfig {
            marks_per_correct: 2.0,
            negative_mark_per_wrong: 0.5,
            ..Default::default()
        };
        let current = session::apply_manual_key(loaded(config), "1 B\n2 B\n3 B");
        let answers = parse_answer_sheet("1 B\n2 A");

        let (report, notices) = grade(&current, &answers);
        assert_eq!(report.correct, 1);
        assert_eq!(report.incorrect, 1);
        assert!((report.total - 1.5).abs() < 1e-9);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_grade_reports_missing_key_entries() {
        let current = session::apply_manual_key(loaded(ExamConfig::default()), "1 B\n9 A");
        let (report, notices) = grade(&current, &parse_answer_sheet("1 B"));

        assert_eq!(report.correct, 1);
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notice::MissingInKey { total: 2, .. })));
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notice::MissingInQuestions { total: 1, .. })));
    }
}
