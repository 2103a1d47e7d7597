//! Error types for the taxon hierarchy engine.

use thiserror::Error;

/// Result type alias using taxon's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for taxon operations.
///
/// Service-call failures are split into explicit categories so the retry
/// policy in [`crate::retry`] can classify them without probing backend
/// exception types.
#[derive(Error, Debug)]
pub enum Error {
    /// Service rejected the request due to rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Service is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Connection failed or was reset.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Service returned a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Text generation failed or produced a malformed response.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Embedding generation failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector partitioning failed.
    #[error("Partition error: {0}")]
    Partition(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_connect() {
            Error::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            Error::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Error::Connection(e.to_string())
        }
    }
}
