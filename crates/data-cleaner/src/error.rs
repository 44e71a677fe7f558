//! Cleaning Error Types

use thiserror::Error;

/// Errors during record cleaning and loading
#[derive(Debug, Clone, Error)]
pub enum CleanError {
    /// Value could not be coerced to a number
    #[error("Malformed value {value:?} in column {column}: expected a decimal number")]
    MalformedInput { column: String, value: String },

    /// Required column absent from a single record
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Training data could not be parsed
    #[error("Invalid CSV data: {0}")]
    Csv(String),

    /// Training data could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<csv::Error> for CleanError {
    fn from(err: csv::Error) -> Self {
        CleanError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for CleanError {
    fn from(err: std::io::Error) -> Self {
        CleanError::Io(err.to_string())
    }
}
