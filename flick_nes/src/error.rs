use std::{error, fmt};

/// An error reported by an emulator core.
///
/// These are not recoverable: a core that fails to advance or to load a state is assumed to
/// hold corrupted or incompatible data.
#[derive(Debug, Clone)]
pub enum EmulatorError {
    /// Additional context for an inner error.
    Context {
        /// A description of what was being done.
        context: String,
        /// The underlying error.
        error: Box<EmulatorError>,
    },
    /// The program image could not be loaded.
    InvalidProgramImage {
        /// Why the image was rejected.
        reason: String,
    },
    /// A serialized state could not be loaded.
    InvalidState {
        /// Why the state was rejected.
        reason: String,
    },
    /// The core failed while executing a frame.
    Execution {
        /// The frame (counted from power-on) that was being executed.
        frame: u64,
        /// The core's description of the failure.
        reason: String,
    },
}

impl EmulatorError {
    /// Wrap the error with a description of the surrounding operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            error: Box::new(self),
        }
    }
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            EmulatorError::InvalidProgramImage { reason } => {
                write!(f, "invalid program image: {}", reason)
            }
            EmulatorError::InvalidState { reason } => write!(f, "invalid state: {}", reason),
            EmulatorError::Execution { frame, reason } => {
                write!(f, "emulator failed on frame {}: {}", frame, reason)
            }
        }
    }
}

impl error::Error for EmulatorError {}
