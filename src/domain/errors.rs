//! Domain error types
//!
//! This module defines the error hierarchy for the sync engine. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main sync engine error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors (missing credentials, malformed field mapping)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote platform errors
    #[error("Remote platform error: {0}")]
    Remote(#[from] RemoteError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Query generation / validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single streamed record could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Poll loop exceeded the maximum wait
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Illegal run state transitions
    #[error("State error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Remote platform errors
///
/// Errors that occur when talking to the remote GraphQL endpoint.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-level failure (no HTTP status received)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Throttled or server-side failure (429/5xx)
    #[error("Transient HTTP failure: {status} - {message}")]
    Transient { status: u16, message: String },

    /// Any other non-success HTTP status
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Top-level GraphQL errors array was non-empty
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The start-job mutation returned userErrors
    #[error("Bulk operation rejected: {0}")]
    UserErrors(String),

    /// The remote job ended in a failure state
    #[error("Bulk operation {status}: {message}")]
    JobFailed { status: String, message: String },

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Build the right variant for an HTTP status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 || (500..600).contains(&status) {
            RemoteError::Transient { status, message }
        } else {
            RemoteError::Http { status, message }
        }
    }

    /// Whether a retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Connection(_) | RemoteError::Timeout(_) | RemoteError::Transient { .. }
        )
    }
}

impl SyncError {
    /// Whether the error came from a transient remote condition
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote(e) => e.is_retryable(),
            _ => false,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
