//! User-visible, non-blocking conditions raised while building an exam.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on the number of question numbers listed in a notice.
pub const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A document could not be read; the pipeline continued with no text.
    SourceUnreadable { source: String, reason: String },
    QuestionsParsed { count: usize },
    /// Questions that fell back to free text.
    NoOptions { numbers: Vec<String>, total: usize },
    Truncated { kept: usize, dropped: usize },
    /// Raw key text that matched none of the question's options.
    UnresolvedKey { numbers: Vec<String>, total: usize },
    MissingInKey { numbers: Vec<String>, total: usize },
    MissingInQuestions { numbers: Vec<String>, total: usize },
    LowConfidenceKey { numbers: Vec<String>, total: usize },
    DeadlineExceeded { late_by_seconds: i64 },
}

impl Notice {
    /// Warnings deserve attention; the rest is informational.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Notice::QuestionsParsed { .. })
    }
}

/// Keep the first [`SAMPLE_LIMIT`] numbers and the full count.
pub fn sample(numbers: &[String]) -> (Vec<String>, usize) {
    (
        numbers.iter().take(SAMPLE_LIMIT).cloned().collect(),
        numbers.len(),
    )
}

fn list(numbers: &[String], total: usize) -> String {
    let mut out = numbers.join(", ");
    if total > numbers.len() {
        out.push_str(&format!(" (+{} more)", total - numbers.len()));
    }
    out
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SourceUnreadable { source, reason } => {
                write!(f, "Could not read {}: {}", source, reason)
            }
            Notice::QuestionsParsed { count } => write!(f, "Parsed {} questions", count),
            Notice::NoOptions { numbers, total } => write!(
                f,
                "{} questions have no detected options: {}",
                total,
                list(numbers, *total)
            ),
            Notice::Truncated { kept, dropped } => write!(
                f,
                "Kept the first {} questions; {} more were dropped",
                kept, dropped
            ),
            Notice::UnresolvedKey { numbers, total } => write!(
                f,
                "{} key entries match no option: {}",
                total,
                list(numbers, *total)
            ),
            Notice::MissingInKey { numbers, total } => write!(
                f,
                "{} questions are missing from the answer key: {}",
                total,
                list(numbers, *total)
            ),
            Notice::MissingInQuestions { numbers, total } => write!(
                f,
                "{} key entries have no matching question: {}",
                total,
                list(numbers, *total)
            ),
            Notice::LowConfidenceKey { numbers, total } => write!(
                f,
                "{} key entries were inferred with low confidence, please verify: {}",
                total,
                list(numbers, *total)
            ),
            Notice::DeadlineExceeded { late_by_seconds } => write!(
                f,
                "Submitted {}m {}s after the deadline",
                late_by_seconds / 60,
                late_by_seconds % 60
            ),
        }
    }
}
