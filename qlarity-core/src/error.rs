//! Error types for Qlarity core.

use std::{error::Error, fmt, io};

/// Error type for Qlarity core operations.
#[derive(Debug)]
pub enum QlarityError {
    /// An underlying I/O error.
    Io(io::Error),
    /// The input was not valid JSON.
    InvalidJson(serde_json::Error),
    /// The JSON value matched none of the accepted report shapes.
    UnrecognizedFormat(String),
    /// A recognized shape contained a report that could not be decoded.
    InvalidReport(serde_json::Error),
    /// A selection referenced a report id that is not loaded.
    UnknownReport(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for QlarityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::InvalidJson(err) => write!(f, "invalid JSON: {err}"),
            Self::UnrecognizedFormat(detail) => {
                write!(f, "unrecognized coverage report format: {detail}")
            }
            Self::InvalidReport(err) => write!(f, "invalid coverage report: {err}"),
            Self::UnknownReport(id) => write!(f, "report not found: {id}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for QlarityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidJson(err) | Self::InvalidReport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for QlarityError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for QlarityError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

impl QlarityError {
    /// Whether the error rejects the content of an input (as opposed to I/O).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidJson(_) | Self::UnrecognizedFormat(_) | Self::InvalidReport(_)
        )
    }
}

/// Convenience result type for Qlarity core.
pub type Result<T> = std::result::Result<T, QlarityError>;
