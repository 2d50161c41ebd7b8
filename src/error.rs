//! Error types for the timetable engine.

use thiserror::Error;

/// Errors that can occur in timetable engine operations.
#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar mirror error: {0}")]
    Mirror(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for timetable engine operations.
pub type TimetableResult<T> = Result<T, TimetableError>;
