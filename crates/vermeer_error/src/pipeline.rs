//! Pipeline stage error types.

use crate::{LedgerErrorKind, ProviderErrorKind, QueueErrorKind, StorageErrorKind, StoreErrorKind};

/// Specific error conditions for pipeline stages.
///
/// Stage handlers use [`PipelineErrorKind::is_retryable`] to decide between
/// scheduling a retry and failing the job terminally. Missing prerequisites
/// and rejected debits are ordering or state bugs, not transient conditions,
/// so they never retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineErrorKind {
    /// Project does not exist or does not belong to the submitting user
    ProjectNotFound(String),
    /// Template does not exist for the project
    TemplateNotFound(String),
    /// Template has no art style attached
    ArtStyleNotFound(String),
    /// No summary in the cache for the project
    SummaryNotFound(String),
    /// Image row does not exist
    ImageNotFound(String),
    /// No product with the given external identifier
    ProductNotFound(String),
    /// Job payload did not match the stage's expected shape
    Payload(String),
    /// Model provider call failed
    Provider(ProviderErrorKind),
    /// Credit ledger rejected or failed the operation
    Ledger(LedgerErrorKind),
    /// Object storage operation failed
    Storage(StorageErrorKind),
    /// Relational store operation failed
    Store(StoreErrorKind),
    /// Cache backend failure
    Cache(String),
    /// Enqueueing a follow-up job failed
    Queue(QueueErrorKind),
}

impl std::fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineErrorKind::ProjectNotFound(id) => write!(f, "Project not found: {}", id),
            PipelineErrorKind::TemplateNotFound(id) => write!(f, "Template not found: {}", id),
            PipelineErrorKind::ArtStyleNotFound(id) => {
                write!(f, "Art style not found for template: {}", id)
            }
            PipelineErrorKind::SummaryNotFound(key) => write!(f, "Summary not found: {}", key),
            PipelineErrorKind::ImageNotFound(id) => write!(f, "Image not found: {}", id),
            PipelineErrorKind::ProductNotFound(id) => write!(f, "Product not found: {}", id),
            PipelineErrorKind::Payload(msg) => write!(f, "Invalid stage payload: {}", msg),
            PipelineErrorKind::Provider(kind) => write!(f, "Provider error: {}", kind),
            PipelineErrorKind::Ledger(kind) => write!(f, "Ledger error: {}", kind),
            PipelineErrorKind::Storage(kind) => write!(f, "Storage error: {}", kind),
            PipelineErrorKind::Store(kind) => write!(f, "Store error: {}", kind),
            PipelineErrorKind::Cache(msg) => write!(f, "Cache error: {}", msg),
            PipelineErrorKind::Queue(kind) => write!(f, "Queue error: {}", kind),
        }
    }
}

impl PipelineErrorKind {
    /// Check if a stage hitting this error should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineErrorKind::Provider(kind) => kind.is_retryable(),
            PipelineErrorKind::Ledger(kind) => matches!(kind, LedgerErrorKind::Backend(_)),
            PipelineErrorKind::Storage(_) => true,
            PipelineErrorKind::Store(kind) => matches!(kind, StoreErrorKind::Connection(_)),
            PipelineErrorKind::Cache(_) => true,
            PipelineErrorKind::Queue(kind) => matches!(kind, QueueErrorKind::Store(_)),
            _ => false,
        }
    }

    /// True when a required upstream artifact or record was missing.
    pub fn is_missing_prerequisite(&self) -> bool {
        matches!(
            self,
            PipelineErrorKind::ProjectNotFound(_)
                | PipelineErrorKind::TemplateNotFound(_)
                | PipelineErrorKind::ArtStyleNotFound(_)
                | PipelineErrorKind::SummaryNotFound(_)
                | PipelineErrorKind::ImageNotFound(_)
        )
    }
}

/// Pipeline error with source location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::SummaryNotFound(
///     "project:1:summary".to_string(),
/// ));
/// assert!(err.kind.is_missing_prerequisite());
/// assert!(!err.kind.is_retryable());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for PipelineError {}

impl From<crate::ProviderError> for PipelineError {
    fn from(err: crate::ProviderError) -> Self {
        PipelineError::new(PipelineErrorKind::Provider(err.kind))
    }
}

impl From<crate::LedgerError> for PipelineError {
    fn from(err: crate::LedgerError) -> Self {
        PipelineError::new(PipelineErrorKind::Ledger(err.kind))
    }
}

impl From<crate::StorageError> for PipelineError {
    fn from(err: crate::StorageError) -> Self {
        PipelineError::new(PipelineErrorKind::Storage(err.kind))
    }
}

impl From<crate::StoreError> for PipelineError {
    fn from(err: crate::StoreError) -> Self {
        PipelineError::new(PipelineErrorKind::Store(err.kind))
    }
}

impl From<crate::CacheError> for PipelineError {
    fn from(err: crate::CacheError) -> Self {
        PipelineError::new(PipelineErrorKind::Cache(err.message))
    }
}

impl From<crate::QueueError> for PipelineError {
    fn from(err: crate::QueueError) -> Self {
        PipelineError::new(PipelineErrorKind::Queue(err.kind))
    }
}
