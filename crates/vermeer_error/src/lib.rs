//! Error types for the Vermeer image generation pipeline.
//!
//! Each domain gets its own error module with a kind enum and a wrapper
//! struct that records the source location where the error was created.
//! The [`VermeerError`] facade aggregates them for callers that cross
//! domain boundaries.

mod cache;
mod config;
mod ledger;
mod pipeline;
mod provider;
mod queue;
mod storage;
mod store;

pub use cache::CacheError;
pub use config::ConfigError;
pub use ledger::{LedgerError, LedgerErrorKind};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::{ProviderError, ProviderErrorKind};
pub use queue::{QueueError, QueueErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use store::{StoreError, StoreErrorKind};

/// Unified error type spanning every Vermeer domain.
#[derive(Debug, Clone, derive_more::Display, derive_more::From)]
pub enum VermeerError {
    /// Cache operation failed
    #[display("{}", _0)]
    Cache(CacheError),
    /// Configuration problem
    #[display("{}", _0)]
    Config(ConfigError),
    /// Credit ledger operation failed
    #[display("{}", _0)]
    Ledger(LedgerError),
    /// Pipeline stage failed
    #[display("{}", _0)]
    Pipeline(PipelineError),
    /// Model provider call failed
    #[display("{}", _0)]
    Provider(ProviderError),
    /// Queue operation failed
    #[display("{}", _0)]
    Queue(QueueError),
    /// Object storage operation failed
    #[display("{}", _0)]
    Storage(StorageError),
    /// Relational store operation failed
    #[display("{}", _0)]
    Store(StoreError),
}

impl std::error::Error for VermeerError {}

/// Result alias for fallible Vermeer operations.
pub type VermeerResult<T> = Result<T, VermeerError>;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result alias for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
