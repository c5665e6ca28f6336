//! Error types and Result aliases for ucidriver

use std::fmt;
use std::path::PathBuf;

use crate::models::SessionState;

/// Result type alias for ucidriver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ucidriver
///
/// "Nothing came back" is never an error: reads that see no output and
/// parsers that find no match return `None` instead.
#[derive(Debug)]
pub enum Error {
    // === Process errors ===
    /// The engine executable could not be started
    SpawnFailed {
        command: String,
        reason: String,
    },

    /// Writing to the engine's stdin failed (e.g. broken pipe)
    WriteFailed {
        command: String,
        reason: String,
    },

    /// The engine exited or its output stream failed while a
    /// predicate-gated read was pending
    UnexpectedTermination {
        reason: String,
    },

    // === Session errors ===
    /// Operation invoked on a session that is not in the `Ready` state
    NotReady {
        state: SessionState,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Configuration validation failed
    ConfigInvalid(crate::config::ConfigError),

    // === I/O errors ===
    /// I/O errors
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SpawnFailed { command, reason } => {
                write!(f, "Failed to spawn engine '{}': {}", command, reason)
            }
            Error::WriteFailed { command, reason } => {
                write!(f, "Failed to write '{}' to engine: {}", command, reason)
            }
            Error::UnexpectedTermination { reason } => {
                write!(f, "Engine terminated while awaiting a response: {}", reason)
            }
            Error::NotReady { state } => {
                write!(f, "Engine session is not ready (state: {})", state)
            }
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }
            Error::ConfigInvalid(err) => write!(f, "Invalid configuration: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigInvalid(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::ConfigInvalid(err)
    }
}
