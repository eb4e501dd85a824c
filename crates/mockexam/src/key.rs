use std::path::PathBuf;

use colored::Colorize;
use mockexam_core::answer_key::{merge_keys, parse_key, parse_key_lines, KeyFormat};
use mockexam_core::notice::{sample, Notice};
use mockexam_core::types::AnswerKey;

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Answer-key PDF
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Answer-key text file, one `number answer` per line (`-` for stdin)
    #[arg(long)]
    text: Option<PathBuf>,

    /// How to read the key PDF: auto, lines or annotated
    #[arg(long, default_value = "auto")]
    format: KeyFormat,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Parse the key document and the manual key text, manual entries last.
pub fn collect(
    pdf: Option<&std::path::Path>,
    text: Option<&std::path::Path>,
    format: KeyFormat,
) -> Result<(AnswerKey, Vec<Notice>)> {
    let mut notices = Vec::new();
    let mut sources = Vec::new();

    if let Some(path) = pdf {
        let (source, unreadable) = crate::source::open_pdf(path);
        notices.extend(unreadable);
        let pages: Vec<String> = (0..source.page_count())
            .map(|i| source.page_text(i))
            .collect();
        sources.push(parse_key(&pages.join("\n"), format));
    }
    if let Some(path) = text {
        sources.push(parse_key_lines(&crate::source::read_text(path)?));
    }

    let key = merge_keys(sources);
    let low = key.low_confidence_numbers();
    if !low.is_empty() {
        let (numbers, total) = sample(&low);
        notices.push(Notice::LowConfidenceKey { numbers, total });
    }
    Ok((key, notices))
}

pub fn run(options: Options, _global: crate::Global) -> Result<()> {
    if options.pdf.is_none() && options.text.is_none() {
        return Err(eyre!("Pass --pdf and/or --text"));
    }

    let (key, notices) = collect(options.pdf.as_deref(), options.text.as_deref(), options.format)?;
    print_notices(&notices);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&key)?);
    } else {
        print_key(&key);
    }
    Ok(())
}

pub fn print_key(key: &AnswerKey) {
    if key.is_empty() {
        println!("No answer key entries found.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "No.".bold().cyan(),
        "Answer".bold().cyan(),
        "Source".bold().cyan()
    ]);
    for (number, entry) in key.entries() {
        let confidence = entry.confidence.to_string();
        let confidence = if entry.confidence.is_low() {
            confidence.yellow()
        } else {
            confidence.bright_black()
        };
        table.add_row(prettytable::row![
            number.green(),
            entry.value.to_string(),
            confidence
        ]);
    }
    table.printstd();
}
