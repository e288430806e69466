//! Error types for Content-Security-Policy operations

use thiserror::Error;

/// Result type for CSP operations
pub type CspResult<T> = Result<T, CspError>;

/// Content-Security-Policy errors
#[derive(Debug, Error)]
pub enum CspError {
    /// A mutation was attempted after the response headers were committed
    #[error("Headers has been sent already")]
    HeadersAlreadySent,

    /// Malformed argument (scheme, hash algorithm, header name or value)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("CSP configuration error: {0}")]
    Config(String),

    /// Configuration could not be deserialized
    #[error("CSP configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CspError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error was raised because headers were already sent
    pub fn is_headers_already_sent(&self) -> bool {
        matches!(self, Self::HeadersAlreadySent)
    }

    /// Check if this error is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
