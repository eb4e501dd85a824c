use std::path::Path;

use mockexam_core::config::ExamConfig;
use mockexam_core::segment::Script;

use crate::prelude::*;

/// Exam settings that can be given on the command line or through the
/// environment. Anything set here overrides the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Exam title
    #[arg(long, env = "MOCKEXAM_TITLE")]
    title: Option<String>,

    /// Exam duration in minutes (1-600)
    #[arg(long, env = "MOCKEXAM_DURATION")]
    duration: Option<u32>,

    /// Marks per correct answer
    #[arg(long, env = "MOCKEXAM_MARKS")]
    marks: Option<f64>,

    /// Marks deducted per wrong answer
    #[arg(long, env = "MOCKEXAM_NEGATIVE")]
    negative: Option<f64>,

    /// Pages alternate between two languages; keep every second page
    #[arg(long)]
    alternating_pages: bool,

    /// The first page is in the secondary language
    #[arg(long)]
    first_page_secondary: bool,

    /// Read each page as two columns, left first
    #[arg(long)]
    two_column: bool,

    /// Drop blocks written mostly in the secondary script
    #[arg(long)]
    filter_secondary: bool,

    /// Secondary script (devanagari, bengali, tamil, arabic, cyrillic, greek, han)
    #[arg(long, value_parser = parse_script)]
    script: Option<Script>,

    /// Share of secondary-script characters that marks a block as secondary
    #[arg(long)]
    threshold: Option<f32>,

    /// Maximum number of questions to keep
    #[arg(long)]
    max_questions: Option<usize>,
}

fn parse_script(value: &str) -> std::result::Result<Script, String> {
    match value.to_ascii_lowercase().as_str() {
        "devanagari" => Ok(Script::Devanagari),
        "bengali" => Ok(Script::Bengali),
        "tamil" => Ok(Script::Tamil),
        "arabic" => Ok(Script::Arabic),
        "cyrillic" => Ok(Script::Cyrillic),
        "greek" => Ok(Script::Greek),
        "han" => Ok(Script::Han),
        other => Err(format!("unknown script: {}", other)),
    }
}

impl ConfigArgs {
    /// Apply the overrides that were given.
    pub fn apply(&self, mut config: ExamConfig) -> ExamConfig {
        if let Some(title) = &self.title {
            config.exam_title = title.clone();
        }
        if let Some(duration) = self.duration {
            config.duration_minutes = duration;
        }
        if let Some(marks) = self.marks {
            config.marks_per_correct = marks;
        }
        if let Some(negative) = self.negative {
            config.negative_mark_per_wrong = negative;
        }
        config.alternating_pages |= self.alternating_pages;
        config.first_page_is_secondary_language |= self.first_page_secondary;
        config.two_column |= self.two_column;
        config.filter_secondary_language |= self.filter_secondary;
        if let Some(script) = self.script {
            config.secondary_script = script;
        }
        if let Some(threshold) = self.threshold {
            config.secondary_threshold = threshold;
        }
        if let Some(max) = self.max_questions {
            config.max_questions = max;
        }
        config
    }
}

/// Built-in defaults, then the TOML file (if any), then `args`.
pub fn load(path: Option<&Path>, args: &ConfigArgs) -> Result<ExamConfig> {
    let base = match path {
        Some(path) => {
            log::debug!("reading config from {}", path.display());
            let content = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
            ExamConfig::from_toml_str(&content).map_err(Error::from)?
        }
        None => ExamConfig::default(),
    };

    let config = args.apply(base);
    config.validate().map_err(Error::from)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_file() {
        let config = load(None, &ConfigArgs::default()).unwrap();
        assert_eq!(config, ExamConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "exam_title = \"From File\"\nduration_minutes = 90").unwrap();

        let args = ConfigArgs {
            title: Some("From Flag".to_string()),
            two_column: true,
            ..Default::default()
        };
        let config = load(Some(file.path()), &args).unwrap();
        assert_eq!(config.exam_title, "From Flag");
        assert_eq!(config.duration_minutes, 90);
        assert!(config.two_column);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = ConfigArgs {
            negative: Some(-1.0),
            ..Default::default()
        };
        assert!(load(None, &args).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(&missing), &ConfigArgs::default()).is_err());
    }

    #[test]
    fn test_parse_script_names() {
        assert_eq!(parse_script("Greek"), Ok(Script::Greek));
        assert!(parse_script("klingon").is_err());
    }
}
