use crate::{Job, JobId, JobStatus, QueueStats};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use vermeer_error::QueueResult;

/// Persistence backend for jobs.
///
/// The store is deliberately dumb: it records state transitions and hands
/// out claims, while retry scheduling and dead-letter decisions belong to
/// the worker pool. Claims are leases, so a job whose worker died becomes
/// claimable again once its lease expires and delivery is at-least-once.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Adds a job in `Waiting` state.
    async fn enqueue(&self, job: Job) -> QueueResult<JobId>;

    /// Claims the oldest claimable job on `queue`, if any.
    ///
    /// The claimed job moves to `Active` with its attempt counter bumped
    /// and a lease lasting `lease`. Jobs whose lease expired are claimable
    /// again in their enqueue position.
    async fn claim_next(&self, queue: &str, lease: Duration) -> QueueResult<Option<Job>>;

    /// Marks a job completed.
    async fn mark_completed(&self, id: JobId) -> QueueResult<Job>;

    /// Records a failed attempt. With `retry_at` the job is rescheduled;
    /// without it the job dead-letters.
    async fn mark_failed(
        &self,
        id: JobId,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> QueueResult<Job>;

    /// Appends a progress line to the job's log.
    async fn append_log(&self, id: JobId, line: &str) -> QueueResult<()>;

    /// Fetches a job by id.
    async fn job(&self, id: JobId) -> QueueResult<Job>;

    /// Subscribes to status changes for a job. The receiver is seeded with
    /// the current status, so subscribing after settlement still observes
    /// the terminal state.
    async fn subscribe(&self, id: JobId) -> QueueResult<watch::Receiver<JobStatus>>;

    /// Counts jobs on `queue` by status.
    async fn stats(&self, queue: &str) -> QueueResult<QueueStats>;

    /// All dead-lettered jobs on `queue`, oldest first.
    async fn dead_letters(&self, queue: &str) -> QueueResult<Vec<Job>>;
}
