//! Job queue error types.

/// Specific error conditions for queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueueErrorKind {
    /// Job does not exist in the backing store
    JobNotFound(String),
    /// Job payload could not be serialized or deserialized
    Payload(String),
    /// The awaited job finished in a failed state
    JobFailed {
        /// Job identifier
        job: String,
        /// Error recorded on the terminal attempt
        error: String,
    },
    /// Waiting for a job to finish exceeded the caller's deadline
    WaitTimeout(String),
    /// The queue or worker pool is shutting down
    Shutdown,
    /// Backing store failure
    Store(String),
}

impl std::fmt::Display for QueueErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueErrorKind::JobNotFound(id) => write!(f, "Job '{}' not found", id),
            QueueErrorKind::Payload(msg) => write!(f, "Job payload error: {}", msg),
            QueueErrorKind::JobFailed { job, error } => {
                write!(f, "Job '{}' failed: {}", job, error)
            }
            QueueErrorKind::WaitTimeout(id) => {
                write!(f, "Timed out waiting for job '{}' to finish", id)
            }
            QueueErrorKind::Shutdown => write!(f, "Queue is shutting down"),
            QueueErrorKind::Store(msg) => write!(f, "Queue store error: {}", msg),
        }
    }
}

/// Queue error with source location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{QueueError, QueueErrorKind};
///
/// let err = QueueError::new(QueueErrorKind::Shutdown);
/// assert!(format!("{}", err).contains("shutting down"));
/// ```
#[derive(Debug, Clone)]
pub struct QueueError {
    /// The kind of error that occurred
    pub kind: QueueErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl QueueError {
    /// Create a new QueueError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: QueueErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queue Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for QueueError {}
