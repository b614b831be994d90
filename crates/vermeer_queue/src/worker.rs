use crate::{Job, JobId, JobStore, RetryPolicy};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use vermeer_interface::ErrorSink;

/// What a handler decided about one delivery of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job finished; mark it completed.
    Success,
    /// The attempt failed for a reason that might clear up. The pool
    /// schedules a retry, or dead-letters when attempts are exhausted.
    Retry(String),
    /// The attempt failed permanently. The pool dead-letters immediately
    /// regardless of remaining attempts.
    Fail(String),
}

impl JobOutcome {
    pub fn retry(error: impl std::fmt::Display) -> Self {
        Self::Retry(error.to_string())
    }

    pub fn fail(error: impl std::fmt::Display) -> Self {
        Self::Fail(error.to_string())
    }
}

/// Delivery-scoped facilities handed to a handler alongside the job.
pub struct JobContext {
    job_id: JobId,
    attempt: u32,
    max_attempts: u32,
    store: Arc<dyn JobStore>,
}

impl JobContext {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// One-based delivery number for this run.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True when no retry remains after this delivery. Handlers that must
    /// compensate on terminal failure check this before returning
    /// [`JobOutcome::Retry`].
    pub fn final_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Appends a line to the job's progress log. Log trouble never fails
    /// the job.
    pub async fn log(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::debug!(job = %self.job_id, "{line}");
        if let Err(error) = self.store.append_log(self.job_id, line).await {
            tracing::warn!(%error, job = %self.job_id, "failed to append job log");
        }
    }
}

/// Processes deliveries from one queue.
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    /// Queue this handler consumes.
    fn queue(&self) -> &str;

    /// Processes one delivery and reports what to do with the job.
    async fn handle(&self, job: &Job, ctx: &JobContext) -> JobOutcome;
}

/// Pool of workers claiming and settling jobs.
///
/// Each call to [`spawn`](Self::spawn) starts `concurrency` independent
/// claim loops for one handler; a pool typically hosts the handlers for
/// every queue in the process. Dead letters are reported to the
/// [`ErrorSink`] as they happen.
pub struct WorkerPool {
    store: Arc<dyn JobStore>,
    sink: Arc<dyn ErrorSink>,
    policy: RetryPolicy,
    lease: Duration,
    poll_interval: Duration,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(store: Arc<dyn JobStore>, sink: Arc<dyn ErrorSink>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            sink,
            policy: RetryPolicy::default(),
            lease: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            shutdown,
            workers: Vec::new(),
        }
    }

    /// Replaces the retry policy used when settling failures.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the claim lease. Handlers must settle within the lease or
    /// the job gets redelivered to another worker.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Replaces the idle sleep between empty claim attempts.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Starts `concurrency` workers consuming the handler's queue.
    pub fn spawn(&mut self, handler: Arc<dyn JobHandler>, concurrency: usize) {
        for index in 0..concurrency.max(1) {
            let worker = Worker {
                store: Arc::clone(&self.store),
                sink: Arc::clone(&self.sink),
                handler: Arc::clone(&handler),
                policy: self.policy,
                lease: self.lease,
                poll_interval: self.poll_interval,
                shutdown: self.shutdown.subscribe(),
                index,
            };
            self.workers.push(tokio::spawn(worker.run()));
        }
    }

    /// Number of running workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signals every worker to stop after its current job and waits for
    /// them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

struct Worker {
    store: Arc<dyn JobStore>,
    sink: Arc<dyn ErrorSink>,
    handler: Arc<dyn JobHandler>,
    policy: RetryPolicy,
    lease: Duration,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
    index: usize,
}

impl Worker {
    async fn run(mut self) {
        let queue = self.handler.queue().to_string();
        tracing::debug!(queue, worker = self.index, "worker started");
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            match self.store.claim_next(&queue, self.lease).await {
                Ok(Some(job)) => self.process(job).await,
                Ok(None) => {
                    let sleep = tokio::time::sleep(self.poll_interval);
                    tokio::select! {
                        _ = sleep => {}
                        _ = self.shutdown.changed() => {}
                    }
                }
                Err(error) => {
                    tracing::error!(%error, queue, "failed to claim job");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        tracing::debug!(queue, worker = self.index, "worker stopped");
    }

    async fn process(&self, job: Job) {
        let ctx = JobContext {
            job_id: job.id,
            attempt: job.attempts,
            max_attempts: job.max_attempts,
            store: Arc::clone(&self.store),
        };
        let span = tracing::info_span!(
            "job",
            id = %job.id,
            queue = %job.queue,
            name = %job.name,
            attempt = job.attempts,
        );
        let outcome = self.handler.handle(&job, &ctx).instrument(span).await;
        self.settle(&job, outcome).await;
    }

    async fn settle(&self, job: &Job, outcome: JobOutcome) {
        let settled = match outcome {
            JobOutcome::Success => self.store.mark_completed(job.id).await,
            JobOutcome::Retry(error) if job.has_attempts_left() => {
                let delay = self.policy.delay_for_attempt(job.attempts);
                tracing::warn!(
                    id = %job.id,
                    queue = %job.queue,
                    %error,
                    attempt = job.attempts,
                    delay_ms = delay.as_millis() as u64,
                    "job failed, retry scheduled"
                );
                self.store
                    .mark_failed(job.id, &error, Some(Utc::now() + delay))
                    .await
            }
            JobOutcome::Retry(error) | JobOutcome::Fail(error) => {
                tracing::error!(
                    id = %job.id,
                    queue = %job.queue,
                    %error,
                    attempts = job.attempts,
                    "job dead-lettered"
                );
                self.sink
                    .capture(&format!("queue:{}", job.queue), &error);
                self.store.mark_failed(job.id, &error, None).await
            }
        };
        if let Err(error) = settled {
            tracing::error!(%error, id = %job.id, "failed to settle job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryJobStore, JobBroker, JobStatus};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vermeer_interface::TracingErrorSink;

    const WAIT: Duration = Duration::from_secs(5);

    /// Fails a configured number of deliveries before succeeding.
    struct FlakyHandler {
        queue: String,
        failures: AtomicUsize,
        mode: fn(String) -> JobOutcome,
    }

    impl FlakyHandler {
        fn new(queue: &str, failures: usize, mode: fn(String) -> JobOutcome) -> Self {
            Self {
                queue: queue.to_string(),
                failures: AtomicUsize::new(failures),
                mode,
            }
        }
    }

    #[async_trait::async_trait]
    impl JobHandler for FlakyHandler {
        fn queue(&self) -> &str {
            &self.queue
        }

        async fn handle(&self, _job: &Job, ctx: &JobContext) -> JobOutcome {
            ctx.log(format!("attempt {}", ctx.attempt())).await;
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                (self.mode)("induced failure".to_string())
            } else {
                JobOutcome::Success
            }
        }
    }

    fn fast_pool(store: Arc<InMemoryJobStore>) -> WorkerPool {
        WorkerPool::new(store, Arc::new(TracingErrorSink))
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO))
            .with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn worker_completes_job_and_logs() {
        let store = Arc::new(InMemoryJobStore::new());
        let broker = JobBroker::new(store.clone());
        let mut pool = fast_pool(store.clone());
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 0, JobOutcome::Retry)),
            1,
        );

        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let job = handle.wait(WAIT).await.unwrap();
        assert_eq!(*job.status(), JobStatus::Completed);
        assert_eq!(job.log(), &["attempt 1".to_string()]);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let store = Arc::new(InMemoryJobStore::new());
        let broker = JobBroker::new(store.clone())
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO));
        let mut pool = fast_pool(store.clone());
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 2, JobOutcome::Retry)),
            1,
        );

        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let job = handle.wait(WAIT).await.unwrap();
        assert_eq!(*job.status(), JobStatus::Completed);
        assert_eq!(*job.attempts(), 3);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn exhausted_retries_dead_letter() {
        let store = Arc::new(InMemoryJobStore::new());
        let broker = JobBroker::new(store.clone())
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO));
        let mut pool = fast_pool(store.clone());
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 99, JobOutcome::Retry)),
            1,
        );

        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let job = handle.wait(WAIT).await.unwrap();
        match job.status() {
            JobStatus::DeadLettered { attempts, error } => {
                assert_eq!(*attempts, 3);
                assert_eq!(error, "induced failure");
            }
            other => panic!("expected dead letter, got {other:?}"),
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn permanent_failure_dead_letters_without_retry() {
        let store = Arc::new(InMemoryJobStore::new());
        let broker = JobBroker::new(store.clone())
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO));
        let mut pool = fast_pool(store.clone());
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 99, JobOutcome::Fail)),
            1,
        );

        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let job = handle.wait(WAIT).await.unwrap();
        match job.status() {
            JobStatus::DeadLettered { attempts, .. } => assert_eq!(*attempts, 1),
            other => panic!("expected dead letter, got {other:?}"),
        }
        pool.shutdown().await;
    }

    /// Sink that records captures for assertions.
    #[derive(Default)]
    struct RecordingSink {
        captures: Mutex<Vec<(String, String)>>,
    }

    impl ErrorSink for RecordingSink {
        fn capture(&self, source: &str, message: &str) {
            self.captures
                .lock()
                .unwrap()
                .push((source.to_string(), message.to_string()));
        }
    }

    #[tokio::test]
    async fn dead_letters_reach_the_error_sink() {
        let store = Arc::new(InMemoryJobStore::new());
        let sink = Arc::new(RecordingSink::default());
        let broker = JobBroker::new(store.clone()).with_policy(RetryPolicy::none());
        let mut pool = WorkerPool::new(store.clone(), sink.clone())
            .with_policy(RetryPolicy::none())
            .with_poll_interval(Duration::from_millis(5));
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 99, JobOutcome::Retry)),
            1,
        );

        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        handle.wait(WAIT).await.unwrap();
        pool.shutdown().await;

        let captures = sink.captures.lock().unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].0, "queue:q");
        assert_eq!(captures[0].1, "induced failure");
    }

    #[tokio::test]
    async fn shutdown_stops_idle_workers() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut pool = fast_pool(store);
        pool.spawn(
            Arc::new(FlakyHandler::new("q", 0, JobOutcome::Retry)),
            2,
        );
        assert_eq!(pool.worker_count(), 2);
        // Returns promptly even though no job ever arrived.
        tokio::time::timeout(WAIT, pool.shutdown()).await.unwrap();
    }
}
