//! Asynchronous text-to-image generation with a credit ledger.
//!
//! Vermeer turns a block of prose into a finished illustration through a
//! chain of queued jobs: summarize the text, recommend art styles, build a
//! prompt, and render the image. Each render costs one credit, charged
//! atomically before the provider is called and refunded if the render
//! terminally fails.
//!
//! This crate is the facade: it re-exports the workspace crates and ships
//! the `vermeer` binary. Library users construct a [`Pipeline`] from the
//! collaborators re-exported here; the binary does the same wiring from
//! environment variables and command-line flags.
//!
//! ## Examples
//!
//! Production wiring, as the binary does it:
//!
//! ```no_run
//! use std::sync::Arc;
//! use vermeer::{
//!     FsObjectStore, InMemoryCache, InMemoryJobStore, OpenAiClient, PgStore, Pipeline,
//!     PipelineStore, TextCompletion,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(PgStore::from_env()?);
//! let provider = Arc::new(OpenAiClient::from_env()?);
//! let pipeline = Pipeline::new(
//!     Arc::clone(&store) as Arc<dyn PipelineStore>,
//!     store,
//!     Arc::new(InMemoryCache::new()),
//!     Arc::new(FsObjectStore::new("objects", "http://localhost:3000/objects")),
//!     Arc::clone(&provider) as Arc<dyn TextCompletion>,
//!     provider,
//!     Arc::new(InMemoryJobStore::new()),
//! );
//! let workers = pipeline.spawn_workers();
//! // ... submit renders, then:
//! workers.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use vermeer_cache::{InMemoryCache, MemoCache};
pub use vermeer_core::*;
pub use vermeer_error::{VermeerError, VermeerResult};
pub use vermeer_interface::{ErrorSink, ImageGeneration, TextCompletion, TracingErrorSink};
pub use vermeer_models::{OpenAiClient, OpenAiConfig};
pub use vermeer_pipeline::{
    Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineStatus, SubmitOutcome, SubmitRequest,
    SubmitRequestBuilder,
};
pub use vermeer_queue::{
    InMemoryJobStore, Job, JobBroker, JobHandle, JobId, JobStatus, JobStore, RetryPolicy,
    WorkerPool,
};
pub use vermeer_storage::{FsObjectStore, MemoryObjectStore, ObjectStore, UploadOptions};
pub use vermeer_store::{CreditLedger, MemoryStore, PgStore, PipelineStore};
