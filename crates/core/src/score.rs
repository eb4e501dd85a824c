//! Reconciliation of the answer key against parsed questions, and scoring.

use serde::{Deserialize, Serialize};

use crate::types::{AnswerKey, Answers, KeyEntry, KeyValue, Label, Question};

/// Marks awarded and deducted per question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkingScheme {
    pub marks_per_correct: f64,
    pub negative_mark_per_wrong: f64,
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self {
            marks_per_correct: 1.0,
            negative_mark_per_wrong: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
    /// Answered, but the key has no usable answer for this question.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub number: String,
    /// Correct label after reconciliation, if any.
    pub correct: Option<Label>,
    pub user: Option<String>,
    pub is_correct: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total: f64,
    pub correct: usize,
    pub incorrect: usize,
    pub details: Vec<QuestionResult>,
}

impl ScoreReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.details.iter().filter(|d| d.outcome == outcome).count()
    }
}

/// Resolve a key entry to a canonical label for `question`.
///
/// Raw-text entries match the first option (in option order) that contains
/// the text, ignoring case. Options past `D` cannot be addressed and never
/// match.
pub fn resolve_key(question: &Question, entry: Option<&KeyEntry>) -> Option<Label> {
    match &entry?.value {
        KeyValue::Label(label) => Some(*label),
        KeyValue::Raw(text) => {
            let needle = text.trim().to_lowercase();
            if needle.is_empty() {
                return None;
            }
            question
                .options
                .iter()
                .position(|option| option.to_lowercase().contains(&needle))
                .and_then(Label::from_index)
        }
    }
}

/// Numbers of questions whose key entry could not be resolved to a label.
pub fn unresolved_numbers(questions: &[Question], key: &AnswerKey) -> Vec<String> {
    questions
        .iter()
        .filter(|q| key.contains(&q.number) && resolve_key(q, key.get(&q.number)).is_none())
        .map(|q| q.number.clone())
        .collect()
}

/// Score `answers` against `key`.
///
/// A question is correct only when both a resolved label and a user answer
/// exist and agree (case-insensitively). Answered questions with a resolved
/// label that disagree cost `negative_mark_per_wrong`; unanswered and
/// unresolvable questions contribute nothing.
pub fn evaluate(
    questions: &[Question],
    answers: &Answers,
    key: &AnswerKey,
    scheme: &MarkingScheme,
) -> ScoreReport {
    let mut total = 0.0;
    let mut correct = 0;
    let mut incorrect = 0;
    let mut details = Vec::with_capacity(questions.len());

    for question in questions {
        let resolved = resolve_key(question, key.get(&question.number));
        let user = answers.get(&question.number).map(str::to_string);

        let outcome = match (resolved, user.as_deref()) {
            (_, None) => Outcome::Unanswered,
            (None, Some(_)) => Outcome::Unresolved,
            (Some(label), Some(given)) if given.trim().eq_ignore_ascii_case(&label.to_string()) => {
                Outcome::Correct
            }
            (Some(_), Some(_)) => Outcome::Incorrect,
        };

        match outcome {
            Outcome::Correct => {
                total += scheme.marks_per_correct;
                correct += 1;
            }
            Outcome::Incorrect => {
                total -= scheme.negative_mark_per_wrong;
                incorrect += 1;
            }
            Outcome::Unanswered | Outcome::Unresolved => {}
        }

        details.push(QuestionResult {
            number: question.number.clone(),
            correct: resolved,
            user,
            is_correct: outcome == Outcome::Correct,
            outcome,
        });
    }

    ScoreReport {
        total,
        correct,
        incorrect,
        details,
    }
}
