//! Exam configuration model.

use serde::{Deserialize, Serialize};

use crate::score::MarkingScheme;
use crate::segment::{Script, DEFAULT_SECONDARY_THRESHOLD};

pub const DEFAULT_EXAM_TITLE: &str = "Mock Exam";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const MAX_DURATION_MINUTES: u32 = 600;
pub const DEFAULT_MAX_QUESTIONS: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("duration must be between 1 and 600 minutes, got {0}")]
    Duration(u32),

    #[error("marks per correct answer must be a positive number, got {0}")]
    MarksPerCorrect(f64),

    #[error("negative marking must be zero or a positive number, got {0}")]
    NegativeMark(f64),

    #[error("secondary script threshold must be within 0..=1, got {0}")]
    Threshold(f32),

    #[error("custom script range is empty: {start:#x}..={end:#x}")]
    ScriptRange { start: u32, end: u32 },

    #[error("max questions must be at least 1")]
    MaxQuestions,

    #[error("invalid config file: {0}")]
    Toml(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    pub exam_title: String,
    pub duration_minutes: u32,
    pub marks_per_correct: f64,
    pub negative_mark_per_wrong: f64,
    /// Pages alternate between the primary and secondary language.
    pub alternating_pages: bool,
    pub first_page_is_secondary_language: bool,
    /// Presentation only; parsing ignores it.
    pub one_question_per_page: bool,
    pub two_column: bool,
    pub filter_secondary_language: bool,
    pub secondary_script: Script,
    pub secondary_threshold: f32,
    /// Cap on the number of questions kept per exam.
    pub max_questions: usize,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            exam_title: DEFAULT_EXAM_TITLE.to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            marks_per_correct: 1.0,
            negative_mark_per_wrong: 0.0,
            alternating_pages: false,
            first_page_is_secondary_language: false,
            one_question_per_page: false,
            two_column: false,
            filter_secondary_language: false,
            secondary_script: Script::default(),
            secondary_threshold: DEFAULT_SECONDARY_THRESHOLD,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

impl ExamConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: ExamConfig =
            toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ConfigError::Duration(self.duration_minutes));
        }
        if !(self.marks_per_correct.is_finite() && self.marks_per_correct > 0.0) {
            return Err(ConfigError::MarksPerCorrect(self.marks_per_correct));
        }
        if !(self.negative_mark_per_wrong.is_finite() && self.negative_mark_per_wrong >= 0.0) {
            return Err(ConfigError::NegativeMark(self.negative_mark_per_wrong));
        }
        if !(0.0..=1.0).contains(&self.secondary_threshold) {
            return Err(ConfigError::Threshold(self.secondary_threshold));
        }
        if let Script::Custom { start, end } = self.secondary_script {
            if start > end {
                return Err(ConfigError::ScriptRange { start, end });
            }
        }
        if self.max_questions == 0 {
            return Err(ConfigError::MaxQuestions);
        }
        Ok(())
    }

    pub fn marking_scheme(&self) -> MarkingScheme {
        MarkingScheme {
            marks_per_correct: self.marks_per_correct,
            negative_mark_per_wrong: self.negative_mark_per_wrong,
        }
    }
}
