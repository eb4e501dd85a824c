use crate::prelude::*;
use clap::Parser;

mod config;
mod error;
mod exam;
mod grade;
mod key;
mod prelude;
mod questions;
mod report;
mod source;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Turn mock-exam PDFs into a timed, self-scored exam"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Exam config file (TOML)
    #[clap(long, env = "MOCKEXAM_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "MOCKEXAM_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract and list the questions in a PDF
    Questions(crate::questions::Options),

    /// Parse an answer key from a PDF and/or text lines
    Key(crate::key::Options),

    /// Timed exam session: init, start, answer, submit
    Exam(crate::exam::App),

    /// Score an answer sheet in one go
    Grade(crate::grade::Options),
}

fn main() -> Result<()> {
    let app = App::parse();

    if app.global.verbose && std::env::var_os("RUST_LOG").is_none() {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    color_eyre::install()?;

    match app.command {
        SubCommands::Questions(options) => crate::questions::run(options, app.global),
        SubCommands::Key(options) => crate::key::run(options, app.global),
        SubCommands::Exam(sub_app) => crate::exam::run(sub_app, app.global),
        SubCommands::Grade(options) => crate::grade::run(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
