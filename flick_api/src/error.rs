#![allow(missing_docs)]

use std::{error, fmt, io, sync::Arc};

use flick_nes::EmulatorError;

#[derive(Debug, Clone)]
pub enum Error {
    EmulatorError(EmulatorError),
    Fm2ReadError {
        filename: String,
        error: Arc<io::Error>,
    },
    InvalidFm2Error {
        line: usize,
        reason: String,
    },
    Fm2WriteError {
        filename: String,
        error: Arc<io::Error>,
    },
    ConfigReadError {
        filename: String,
        error: Arc<io::Error>,
    },
    ConfigParseError(Arc<serde_json::Error>),
    InvalidConfig(String),
    WorkerSpawnError(Arc<io::Error>),
    WorkerPanicked,
    LogInitError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmulatorError(error) => write!(f, "{}", error),
            Error::Fm2ReadError { filename, error } => {
                write!(f, "failed to read {}:\n  {}", filename, error)
            }
            Error::InvalidFm2Error { line, reason } => {
                write!(f, "invalid fm2 file on line {}: {}", line, reason)
            }
            Error::Fm2WriteError { filename, error } => {
                write!(f, "failed to write {}:\n  {}", filename, error)
            }
            Error::ConfigReadError { filename, error } => {
                write!(f, "failed to read config {}:\n  {}", filename, error)
            }
            Error::ConfigParseError(error) => write!(f, "failed to parse config: {}", error),
            Error::InvalidConfig(reason) => write!(f, "invalid config: {}", reason),
            Error::WorkerSpawnError(error) => {
                write!(f, "failed to spawn sequence worker: {}", error)
            }
            Error::WorkerPanicked => write!(f, "sequence worker panicked"),
            Error::LogInitError(reason) => write!(f, "failed to initialize logging: {}", reason),
        }
    }
}

impl error::Error for Error {}

impl From<EmulatorError> for Error {
    fn from(v: EmulatorError) -> Self {
        Self::EmulatorError(v)
    }
}

impl From<serde_json::Error> for Error {
    fn from(v: serde_json::Error) -> Self {
        Self::ConfigParseError(Arc::new(v))
    }
}
