//! Exam session state.
//!
//! A [`Session`] is a plain value. Every stage takes the current session and
//! its new input and returns the next session, together with any notices the
//! stage raised. Nothing here performs I/O; the current time is passed in.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::answer_key::{parse_key, parse_key_lines, KeyFormat};
use crate::config::ExamConfig;
use crate::notice::{sample, Notice};
use crate::question::{normalize_whitespace, parse_blocks};
use crate::score::{evaluate, unresolved_numbers, ScoreReport};
use crate::segment::{segment_document, PageSource, SegmentOptions};
use crate::types::{compare_numbers, AnswerKey, Answers, Question};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no questions loaded; load a question document first")]
    NoQuestions,

    #[error("the exam has not been started")]
    NotStarted,

    #[error("the exam was already submitted")]
    AlreadySubmitted,

    #[error("the exam is already running")]
    AlreadyStarted,

    #[error("unknown question number: {0}")]
    UnknownQuestion(String),
}

/// Result of a submission, kept on the session once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submitted_at: DateTime<Utc>,
    pub report: ScoreReport,
    pub notices: Vec<Notice>,
}

/// Question numbers present on one side of the reconciliation only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCheck {
    pub missing_in_key: Vec<String>,
    pub missing_in_questions: Vec<String>,
}

impl CrossCheck {
    pub fn is_clean(&self) -> bool {
        self.missing_in_key.is_empty() && self.missing_in_questions.is_empty()
    }

    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if !self.missing_in_key.is_empty() {
            let (numbers, total) = sample(&self.missing_in_key);
            notices.push(Notice::MissingInKey { numbers, total });
        }
        if !self.missing_in_questions.is_empty() {
            let (numbers, total) = sample(&self.missing_in_questions);
            notices.push(Notice::MissingInQuestions { numbers, total });
        }
        notices
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub config: ExamConfig,
    pub questions: Vec<Question>,
    /// Key recovered from a key document.
    pub document_key: AnswerKey,
    /// Manually entered key lines; always applied on top of `document_key`.
    pub manual_key: AnswerKey,
    pub answers: Answers,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub submission: Option<Submission>,
}

impl Session {
    pub fn new(config: ExamConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The effective answer key: document entries overridden by manual ones.
    pub fn key(&self) -> AnswerKey {
        let mut key = self.document_key.clone();
        key.merge(self.manual_key.clone());
        key
    }

    pub fn question(&self, number: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.number == number)
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Segment and parse the question document.
///
/// A no-op while questions are already held, unless `force` is set. At most
/// `config.max_questions` questions are kept.
pub fn load_questions(
    mut session: Session,
    source: &dyn PageSource,
    force: bool,
) -> (Session, Vec<Notice>) {
    if !session.questions.is_empty() && !force {
        return (session, Vec::new());
    }

    let blocks = segment_document(source, &SegmentOptions::from(&session.config));
    let mut questions = parse_blocks(&blocks);
    let mut notices = Vec::new();

    let cap = session.config.max_questions;
    if questions.len() > cap {
        notices.push(Notice::Truncated {
            kept: cap,
            dropped: questions.len() - cap,
        });
        questions.truncate(cap);
    }

    notices.insert(
        0,
        Notice::QuestionsParsed {
            count: questions.len(),
        },
    );

    let without_options: Vec<String> = questions
        .iter()
        .filter(|q| !q.has_options())
        .map(|q| q.number.clone())
        .collect();
    if !without_options.is_empty() {
        let (numbers, total) = sample(&without_options);
        notices.push(Notice::NoOptions { numbers, total });
    }

    session.questions = questions;
    (session, notices)
}

/// Parse the answer-key document. Memoized like [`load_questions`].
pub fn load_key_document(
    mut session: Session,
    source: &dyn PageSource,
    format: KeyFormat,
    force: bool,
) -> (Session, Vec<Notice>) {
    if !session.document_key.is_empty() && !force {
        return (session, Vec::new());
    }

    let text: Vec<String> = (0..source.page_count())
        .map(|i| source.page_text(i))
        .collect();
    let key = parse_key(&text.join("\n"), format);

    let mut notices = Vec::new();
    let low = key.low_confidence_numbers();
    if !low.is_empty() {
        let (numbers, total) = sample(&low);
        notices.push(Notice::LowConfidenceKey { numbers, total });
    }

    session.document_key = key;
    (session, notices)
}

/// Merge manually entered key lines. Later manual entries win, and manual
/// entries always override the document key.
pub fn apply_manual_key(mut session: Session, text: &str) -> Session {
    session.manual_key.merge(parse_key_lines(text));
    session
}

/// Start the timer. A session can only be started once; see [`restart`].
pub fn start(mut session: Session, now: DateTime<Utc>) -> Result<Session, SessionError> {
    if session.questions.is_empty() {
        return Err(SessionError::NoQuestions);
    }
    if session.submission.is_some() {
        return Err(SessionError::AlreadySubmitted);
    }
    if session.is_started() {
        return Err(SessionError::AlreadyStarted);
    }
    session.started_at = Some(now);
    session.deadline = Some(now + Duration::minutes(i64::from(session.config.duration_minutes)));
    Ok(session)
}

/// Throw away answers and any submission, then start a fresh attempt.
pub fn restart(mut session: Session, now: DateTime<Utc>) -> Result<Session, SessionError> {
    session.answers = Answers::new();
    session.submission = None;
    session.started_at = None;
    session.deadline = None;
    start(session, now)
}

/// Record (or clear, with a blank value) the answer to one question.
pub fn record_answer(
    mut session: Session,
    number: &str,
    answer: &str,
) -> Result<Session, SessionError> {
    if !session.is_started() {
        return Err(SessionError::NotStarted);
    }
    if session.submission.is_some() {
        return Err(SessionError::AlreadySubmitted);
    }
    if session.question(number).is_none() {
        return Err(SessionError::UnknownQuestion(number.to_string()));
    }
    session.answers.record(number, answer);
    Ok(session)
}

/// Replace a question's prompt and/or options. The number never changes.
pub fn edit_question(
    mut session: Session,
    number: &str,
    prompt: Option<&str>,
    options: Option<Vec<String>>,
) -> Result<Session, SessionError> {
    let question = session
        .questions
        .iter_mut()
        .find(|q| q.number == number)
        .ok_or_else(|| SessionError::UnknownQuestion(number.to_string()))?;

    if let Some(prompt) = prompt {
        question.prompt = normalize_whitespace(prompt);
    }
    if let Some(options) = options {
        question.options = options
            .iter()
            .map(|o| normalize_whitespace(o))
            .filter(|o| !o.is_empty())
            .collect();
    }
    Ok(session)
}

/// Time left before the deadline, saturating at zero. `None` before start.
pub fn remaining(session: &Session, now: DateTime<Utc>) -> Option<Duration> {
    session
        .deadline
        .map(|deadline| (deadline - now).max(Duration::zero()))
}

/// Compare question numbers against the effective key.
pub fn cross_check(session: &Session) -> CrossCheck {
    let key = session.key();

    let missing_in_key = session
        .questions
        .iter()
        .filter(|q| !key.contains(&q.number))
        .map(|q| q.number.clone())
        .collect();

    let mut missing_in_questions: Vec<String> = key
        .entries()
        .into_iter()
        .map(|(number, _)| number)
        .filter(|number| session.question(number).is_none())
        .map(str::to_string)
        .collect();
    missing_in_questions.sort_by(|a, b| compare_numbers(a, b));

    CrossCheck {
        missing_in_key,
        missing_in_questions,
    }
}

/// Every notice about the effective key: cross-check mismatches, entries that
/// match no option, and low-confidence entries.
pub fn key_notices(session: &Session) -> Vec<Notice> {
    let key = session.key();
    let mut notices = cross_check(session).notices();

    let unresolved = unresolved_numbers(&session.questions, &key);
    if !unresolved.is_empty() {
        let (numbers, total) = sample(&unresolved);
        notices.push(Notice::UnresolvedKey { numbers, total });
    }

    let low = key.low_confidence_numbers();
    if !low.is_empty() {
        let (numbers, total) = sample(&low);
        notices.push(Notice::LowConfidenceKey { numbers, total });
    }
    notices
}

/// Score the session. Never refuses: a late submission is scored and
/// recorded with a deadline notice.
pub fn submit(mut session: Session, now: DateTime<Utc>) -> (Session, Submission) {
    let key = session.key();
    let report = evaluate(
        &session.questions,
        &session.answers,
        &key,
        &session.config.marking_scheme(),
    );

    let mut notices = key_notices(&session);
    if let Some(deadline) = session.deadline {
        if now > deadline {
            notices.push(Notice::DeadlineExceeded {
                late_by_seconds: (now - deadline).num_seconds(),
            });
        }
    }

    let submission = Submission {
        submitted_at: now,
        report,
        notices,
    };
    session.submission = Some(submission.clone());
    (session, submission)
}
