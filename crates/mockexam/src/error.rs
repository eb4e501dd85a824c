use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No session at {0}; run `mockexam exam init` first")]
    SessionNotFound(PathBuf),

    #[error("A session already exists at {0}; pass --force to replace it")]
    SessionExists(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(#[from] mockexam_core::config::ConfigError),

    #[error(transparent)]
    Session(#[from] mockexam_core::session::SessionError),
}
