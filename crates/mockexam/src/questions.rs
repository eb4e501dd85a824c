use std::path::PathBuf;

use colored::Colorize;
use mockexam_core::question::serialize_question;
use mockexam_core::session::{load_questions, Session};
use mockexam_core::types::{option_label, Question};

use crate::config::ConfigArgs;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Question PDF
    pdf: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print each question as plain text instead of a table
    #[arg(long, conflicts_with = "json")]
    plain: bool,

    #[clap(flatten)]
    config: ConfigArgs,
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref(), &options.config)?;
    let (source, unreadable) = crate::source::open_pdf(&options.pdf);

    let (session, notices) = load_questions(Session::new(config), source.as_ref(), false);
    print_notices(unreadable.as_slice());
    print_notices(&notices);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&session.questions)?);
    } else if options.plain {
        for question in &session.questions {
            println!("{}\n", serialize_question(question));
        }
    } else {
        print_questions(&session.questions);
    }
    Ok(())
}

pub fn print_questions(questions: &[Question]) {
    if questions.is_empty() {
        println!("No questions found.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "No.".bold().cyan(),
        "Question".bold().cyan(),
        "Options".bold().cyan()
    ]);
    for question in questions {
        let options = if question.has_options() {
            question
                .options
                .iter()
                .enumerate()
                .map(|(i, text)| format!("{}. {}", option_label(i), text))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            "(free text)".bright_black().to_string()
        };
        table.add_row(prettytable::row![
            question.number.green(),
            question.prompt,
            options
        ]);
    }
    table.printstd();
}
