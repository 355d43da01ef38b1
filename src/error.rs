//! Error type shared by the simulation, the learner and the training loop.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A caller passed a value outside the operation's contract
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A checkpoint or config describes a network of a different shape
    #[error("{what} mismatch: expected {expected}, found {found}")]
    ConfigMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encoding error: {0}")]
    Checkpoint(#[from] bincode::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("score log error: {0}")]
    ScoreLog(#[from] serde_json::Error),

    /// The global subscriber could not be installed
    #[error("failed to install logger: {0}")]
    Logging(String),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}
