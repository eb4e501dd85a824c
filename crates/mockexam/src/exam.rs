use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colored::Colorize;
use mockexam_core::answer_key::KeyFormat;
use mockexam_core::session::{self, Session};
use mockexam_core::types::Question;
use serde::Serialize;

use crate::config::ConfigArgs;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "exam")]
#[command(about = "Run a timed exam session")]
pub struct App {
    /// Session file
    #[arg(
        long,
        env = "MOCKEXAM_SESSION",
        default_value = "mockexam-session.json",
        global = true
    )]
    session: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Create a session from a question PDF and an optional answer key
    Init(InitOptions),

    /// Start the timer
    Start {
        /// Discard answers and any submission and start over
        #[arg(long)]
        force: bool,
    },

    /// Show questions, answers and time left
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question (an empty value clears the answer)
    Answer {
        /// Question number
        number: String,
        /// Option label or free text
        value: String,
    },

    /// Correct a question's text or options
    Edit(EditOptions),

    /// Add manual answer-key lines and show the effective key
    Key {
        /// Key text file, one `number answer` per line (`-` for stdin)
        #[arg(long)]
        text: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the exam and write the result report
    Submit(SubmitOptions),
}

#[derive(Debug, clap::Args)]
pub struct InitOptions {
    /// Question PDF
    #[arg(long)]
    questions: PathBuf,

    /// Answer-key PDF
    #[arg(long)]
    key_pdf: Option<PathBuf>,

    /// Answer-key text file (`-` for stdin); applied after the key PDF
    #[arg(long)]
    key_text: Option<PathBuf>,

    /// How to read the key PDF: auto, lines or annotated
    #[arg(long, default_value = "auto")]
    format: KeyFormat,

    /// Replace an existing session
    #[arg(long)]
    force: bool,

    #[clap(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, clap::Args)]
pub struct EditOptions {
    /// Question number
    number: String,

    /// New question text
    #[arg(long)]
    prompt: Option<String>,

    /// Replacement options in order; repeat for each option
    #[arg(long = "option")]
    options: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct SubmitOptions {
    /// Student name shown on the report
    #[arg(long, env = "MOCKEXAM_STUDENT")]
    student: Option<String>,

    /// Report file (defaults to `<title>_result.txt`)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Output the score as JSON
    #[arg(long)]
    json: bool,
}

/// Snapshot printed by `exam status --json`.
#[derive(Debug, Serialize)]
pub struct StatusOutput<'a> {
    pub exam_title: &'a str,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub remaining_seconds: Option<i64>,
    pub answered: usize,
    pub total: usize,
    pub submitted: bool,
    pub questions: Vec<QuestionStatus<'a>>,
}

#[derive(Debug, Serialize)]
pub struct QuestionStatus<'a> {
    #[serde(flatten)]
    pub question: &'a Question,
    pub answer: Option<&'a str>,
}

// --- Session persistence ---

pub fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Err(Error::SessionNotFound(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read session {}", path.display()))?;
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("Session file {} is corrupt", path.display()))
}

pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(path, json)
        .wrap_err_with(|| format!("Failed to write session {}", path.display()))?;
    log::debug!("session saved to {}", path.display());
    Ok(())
}

// --- Handlers ---

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let path = app.session.as_path();
    let now = Utc::now();

    match app.command {
        Commands::Init(options) => init(path, options, &global),
        Commands::Start { force } => start(path, now, force),
        Commands::Status { json } => status(path, now, json),
        Commands::Answer { number, value } => answer(path, now, &number, &value),
        Commands::Edit(options) => edit(path, options),
        Commands::Key { text, json } => key(path, text.as_deref(), json),
        Commands::Submit(options) => submit(path, now, options),
    }
}

fn init(path: &Path, options: InitOptions, global: &crate::Global) -> Result<()> {
    if path.exists() && !options.force {
        return Err(Error::SessionExists(path.to_path_buf()).into());
    }

    let config = crate::config::load(global.config.as_deref(), &options.config)?;
    let mut notices = Vec::new();

    let (source, unreadable) = crate::source::open_pdf(&options.questions);
    notices.extend(unreadable);
    let (mut current, parsed) = session::load_questions(Session::new(config), source.as_ref(), false);
    notices.extend(parsed);

    if let Some(key_pdf) = &options.key_pdf {
        let (source, unreadable) = crate::source::open_pdf(key_pdf);
        notices.extend(unreadable);
        let (next, key_notices) =
            session::load_key_document(current, source.as_ref(), options.format, false);
        current = next;
        notices.extend(key_notices);
    }
    if let Some(key_text) = &options.key_text {
        current = session::apply_manual_key(current, &crate::source::read_text(key_text)?);
    }

    print_notices(&notices);
    print_notices(&session::cross_check(&current).notices());
    save_session(path, &current)?;

    println!(
        "{} {} questions, {} key entries -> {}",
        "Session ready:".green().bold(),
        current.questions.len(),
        current.key().len(),
        path.display()
    );
    Ok(())
}

fn start(path: &Path, now: DateTime<Utc>, force: bool) -> Result<()> {
    let loaded = load_session(path)?;
    let current = if force {
        session::restart(loaded, now)
    } else {
        session::start(loaded, now)
    }
    .map_err(Error::from)?;
    save_session(path, &current)?;

    if let Some(deadline) = current.deadline {
        println!(
            "{} {} minutes, ends at {}",
            "Started:".green().bold(),
            current.config.duration_minutes,
            deadline.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
    }
    Ok(())
}

fn format_remaining(remaining: chrono::Duration) -> String {
    let seconds = remaining.num_seconds();
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

fn status(path: &Path, now: DateTime<Utc>, json: bool) -> Result<()> {
    let current = load_session(path)?;
    let remaining = session::remaining(&current, now);

    if json {
        let output = StatusOutput {
            exam_title: &current.config.exam_title,
            started_at: current.started_at,
            deadline: current.deadline,
            remaining_seconds: remaining.map(|r| r.num_seconds()),
            answered: current.answers.len(),
            total: current.questions.len(),
            submitted: current.submission.is_some(),
            questions: current
                .questions
                .iter()
                .map(|question| QuestionStatus {
                    question,
                    answer: current.answers.get(&question.number),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", current.config.exam_title.bold());
    match remaining {
        Some(left) if left.is_zero() => println!("{}", "Time is up".red().bold()),
        Some(left) => println!("Time left: {}", format_remaining(left).yellow()),
        None => println!("{}", "Not started".bright_black()),
    }
    println!(
        "Answered {} of {}",
        current.answers.len(),
        current.questions.len()
    );

    if current.config.one_question_per_page {
        for question in &current.questions {
            print_question_card(question, current.answers.get(&question.number));
        }
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "No.".bold().cyan(),
            "Question".bold().cyan(),
            "Answer".bold().cyan()
        ]);
        for question in &current.questions {
            let answer = current.answers.get(&question.number).unwrap_or("-");
            table.add_row(prettytable::row![question.number.green(), question.prompt, answer]);
        }
        table.printstd();
    }
    Ok(())
}

fn print_question_card(question: &Question, answer: Option<&str>) {
    println!();
    println!("{} {}", format!("Q{}.", question.number).green().bold(), question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        println!("   {}. {}", mockexam_core::types::option_label(i), option);
    }
    println!("   answer: {}", answer.unwrap_or("-").yellow());
}

fn answer(path: &Path, now: DateTime<Utc>, number: &str, value: &str) -> Result<()> {
    let current = session::record_answer(load_session(path)?, number, value).map_err(Error::from)?;
    save_session(path, &current)?;

    match current.answers.get(number) {
        Some(recorded) => println!("Q{} = {}", number, recorded.green()),
        None => println!("Q{} cleared", number),
    }
    if session::remaining(&current, now).is_some_and(|left| left.is_zero()) {
        eprintln!(
            "{} the deadline has passed; answers are still recorded",
            "warning:".yellow().bold()
        );
    }
    Ok(())
}

fn edit(path: &Path, options: EditOptions) -> Result<()> {
    let replacement = (!options.options.is_empty()).then_some(options.options);
    let current = session::edit_question(
        load_session(path)?,
        &options.number,
        options.prompt.as_deref(),
        replacement,
    )
    .map_err(Error::from)?;
    save_session(path, &current)?;

    if let Some(question) = current.question(&options.number) {
        crate::questions::print_questions(std::slice::from_ref(question));
    }
    Ok(())
}

fn key(path: &Path, text: Option<&Path>, json: bool) -> Result<()> {
    let mut current = load_session(path)?;
    if let Some(text) = text {
        current = session::apply_manual_key(current, &crate::source::read_text(text)?);
        save_session(path, &current)?;
    }

    print_notices(&session::key_notices(&current));
    if json {
        println!("{}", serde_json::to_string_pretty(&current.key())?);
    } else {
        crate::key::print_key(&current.key());
    }
    Ok(())
}

fn submit(path: &Path, now: DateTime<Utc>, options: SubmitOptions) -> Result<()> {
    let (current, submission) = session::submit(load_session(path)?, now);
    save_session(path, &current)?;
    print_notices(&submission.notices);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&submission.report)?);
    } else {
        crate::report::print_score(&submission.report);
    }

    let written = crate::report::write_report(
        options.report.as_deref(),
        &current.config.exam_title,
        options.student.as_deref(),
        &submission.report,
    )?;
    eprintln!("{} {}", "Report:".bold(), written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn seeded_session(dir: &Path) -> PathBuf {
        let pages = vec!["1) What is 2+2?\nA. 3\nB. 4\nC. 5\n2) Largest planet?\nA. Mars\nB. Jupiter".to_string()];
        let (current, _) = session::load_questions(Session::default(), &pages, false);
        let current = session::apply_manual_key(current, "1 B\n2 B");

        let path = dir.join("session.json");
        save_session(&path, &current).unwrap();
        path
    }

    #[test]
    fn test_missing_session_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_session(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_session(&path).is_err());
    }

    #[test]
    fn test_answer_before_start_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_session(dir.path());
        assert!(answer(&path, t0(), "1", "B").is_err());
    }

    #[test]
    fn test_full_session_flow_persists_between_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_session(dir.path());

        start(&path, t0(), false).unwrap();
        answer(&path, t0(), "1", "B").unwrap();
        answer(&path, t0(), "2", "A").unwrap();

        let stored = load_session(&path).unwrap();
        assert_eq!(stored.answers.get("1"), Some("B"));
        assert_eq!(stored.deadline, Some(t0() + chrono::Duration::minutes(60)));

        let report = dir.path().join("result.txt");
        submit(
            &path,
            t0() + chrono::Duration::minutes(5),
            SubmitOptions {
                student: Some("Ravi".to_string()),
                report: Some(report.clone()),
                json: false,
            },
        )
        .unwrap();

        let stored = load_session(&path).unwrap();
        let submission = stored.submission.unwrap();
        assert_eq!(submission.report.correct, 1);
        assert_eq!(submission.report.incorrect, 1);

        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.starts_with("Exam: Mock Exam\nStudent: Ravi\nScore: 1\n"));
        assert!(text.contains("Q2: your=A correct=B ✖"));
    }

    #[test]
    fn test_edit_persists_new_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_session(dir.path());

        edit(
            &path,
            EditOptions {
                number: "2".to_string(),
                prompt: Some("Largest planet in the solar system?".to_string()),
                options: vec!["Saturn".to_string(), "Jupiter".to_string()],
            },
        )
        .unwrap();

        let stored = load_session(&path).unwrap();
        let question = stored.question("2").unwrap();
        assert_eq!(question.prompt, "Largest planet in the solar system?");
        assert_eq!(question.options, vec!["Saturn", "Jupiter"]);
    }

    #[test]
    fn test_restart_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_session(dir.path());

        start(&path, t0(), false).unwrap();
        answer(&path, t0(), "1", "A").unwrap();
        assert!(start(&path, t0(), false).is_err());

        let later = t0() + chrono::Duration::minutes(3);
        start(&path, later, true).unwrap();
        let stored = load_session(&path).unwrap();
        assert_eq!(stored.started_at, Some(later));
        assert!(stored.answers.is_empty());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(chrono::Duration::seconds(3725)), "01:02:05");
    }
}
