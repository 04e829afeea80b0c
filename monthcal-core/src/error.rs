//! Error types for monthcal.

use thiserror::Error;

/// Errors that can occur in monthcal operations.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    #[error("Invalid first day of week {0}: expected 0 (Sunday) to 6 (Saturday)")]
    InvalidFirstDayOfWeek(u8),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server responded with {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        CalendarError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CalendarError {
    fn from(err: serde_json::Error) -> Self {
        CalendarError::Serialization(err.to_string())
    }
}

/// Result type alias for monthcal operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
