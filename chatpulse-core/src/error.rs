//! Error types for chatpulse-core

use thiserror::Error;

/// Main error type for the chatpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (fixture directories)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixture file that is not a JSON array of rows
    #[error("fixture error in {file}: {message}")]
    Fixture { file: String, message: String },

    /// Configuration error.
    ///
    /// Also raised by a live store that is invoked without credentials, so a
    /// misconfigured deployment surfaces instead of reporting zero activity.
    #[error("configuration error: {0}")]
    Config(String),

    /// Live store request or response error
    #[error("live store error: {0}")]
    Http(String),
}

impl Error {
    /// Returns true for configuration errors.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type alias for chatpulse-core
pub type Result<T> = std::result::Result<T, Error>;
