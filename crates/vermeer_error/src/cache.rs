//! Cache error types.

/// Cache error with source location.
#[derive(Debug, Clone)]
pub struct CacheError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CacheError {
    /// Create a new CacheError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use vermeer_error::CacheError;
    ///
    /// let err = CacheError::new("Backend unavailable");
    /// assert!(err.message.contains("unavailable"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache Error: {} at line {} in {}",
            self.message, self.line, self.file
        )
    }
}

impl std::error::Error for CacheError {}
