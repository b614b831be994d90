//! Persistent job queue with retry, backoff, and dead-lettering.
//!
//! Work flows through four pieces:
//!
//! - [`JobStore`]: persistence for [`Job`]s, with lease-based claims so a
//!   crashed worker's jobs get redelivered. [`InMemoryJobStore`] is the
//!   in-process implementation.
//! - [`JobBroker`]: the producer side. Serializes payloads, stamps the
//!   retry policy, and hands back a [`JobHandle`] for awaiting settlement.
//! - [`WorkerPool`]: the consumer side. Claims jobs, runs a
//!   [`JobHandler`] per queue, and settles each delivery from its
//!   [`JobOutcome`].
//! - [`RetryPolicy`]: exponential backoff schedule shared by both sides.
//!
//! Delivery is at-least-once: a lease that expires mid-flight puts the job
//! back up for claim, so handlers are expected to be idempotent. Failures
//! are split into retryable and permanent by the handler itself; permanent
//! failures and exhausted retries land in the dead-letter state, visible
//! via [`JobStore::dead_letters`] and reported to the configured error
//! sink.

mod job;
mod memory;
mod queue;
mod retry;
mod store;
mod worker;

pub use job::{Job, JobId, JobStatus, QueueStats};
pub use memory::InMemoryJobStore;
pub use queue::{JobBroker, JobHandle};
pub use retry::RetryPolicy;
pub use store::JobStore;
pub use worker::{JobContext, JobHandler, JobOutcome, WorkerPool};
