//! Error types for external model providers.

/// Kinds of provider errors, shared by completion and image generation clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// HTTP/network error
    #[display("HTTP error: {}", _0)]
    Http(String),
    /// API returned an error
    #[display("API error (status {}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Rate limit exceeded
    #[display("Rate limit exceeded")]
    RateLimit,
    /// Model not found
    #[display("Model not found: {}", _0)]
    ModelNotFound(String),
    /// Invalid request
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// Failed to parse response
    #[display("Response parsing failed: {}", _0)]
    ResponseParsing(String),
    /// Response carried no usable content
    #[display("Response contained no content")]
    NoContent,
    /// Builder error
    #[display("Builder error: {}", _0)]
    Builder(String),
}

impl ProviderErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::Http(_) => true,
            ProviderErrorKind::RateLimit => true,
            ProviderErrorKind::Api { status, .. } => {
                matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::RateLimit);
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Provider Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for ProviderError {}
