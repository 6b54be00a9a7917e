//! Common error types for the legislative monitor

use thiserror::Error;

/// Common result type for legis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across legis crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("API returned {status} for {url}")]
    Api { status: u16, url: String },

    /// Response or stored value could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Language model call failed or returned nothing usable
    #[error("AI error: {0}")]
    Ai(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or wrong credentials
    #[error("Unauthorized")]
    Unauthorized,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
