use crate::{Job, JobId, JobStatus, JobStore, RetryPolicy};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use vermeer_error::{QueueError, QueueErrorKind, QueueResult};

/// Producer-side handle to the job store.
///
/// The broker turns typed payloads into [`Job`]s, applies the retry policy
/// that workers will honor, and lets callers await settlement without
/// polling.
#[derive(Clone)]
pub struct JobBroker {
    store: Arc<dyn JobStore>,
    policy: RetryPolicy,
}

impl JobBroker {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy stamped onto newly enqueued jobs.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// Serializes `payload` and enqueues it on `queue`.
    ///
    /// `name` is an operator-facing label that shows up in logs and queue
    /// inspection, conventionally the id of the entity being processed.
    #[tracing::instrument(skip(self, payload))]
    pub async fn enqueue<P: Serialize + ?Sized>(
        &self,
        queue: &str,
        name: &str,
        payload: &P,
    ) -> QueueResult<JobHandle> {
        let value = serde_json::to_value(payload)
            .map_err(|e| QueueError::new(QueueErrorKind::Payload(e.to_string())))?;
        let job = Job::new(queue, name, value, *self.policy.max_attempts());
        let id = self.store.enqueue(job).await?;
        let receiver = self.store.subscribe(id).await?;
        tracing::debug!(%id, "enqueued job");
        Ok(JobHandle {
            id,
            receiver,
            store: Arc::clone(&self.store),
        })
    }

    pub async fn job(&self, id: JobId) -> QueueResult<Job> {
        self.store.job(id).await
    }

    /// Waits until the job settles or `timeout` elapses.
    ///
    /// Returns the settled job whether it completed or dead-lettered; use
    /// [`Job::ensure_completed`] to turn a dead letter into an error.
    pub async fn wait_until_finished(&self, id: JobId, timeout: Duration) -> QueueResult<Job> {
        let mut receiver = self.store.subscribe(id).await?;
        await_settled(&self.store, &mut receiver, id, timeout).await
    }
}

/// Handle to one enqueued job.
pub struct JobHandle {
    id: JobId,
    receiver: watch::Receiver<JobStatus>,
    store: Arc<dyn JobStore>,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Waits until the job settles or `timeout` elapses.
    pub async fn wait(mut self, timeout: Duration) -> QueueResult<Job> {
        await_settled(&self.store, &mut self.receiver, self.id, timeout).await
    }
}

async fn await_settled(
    store: &Arc<dyn JobStore>,
    receiver: &mut watch::Receiver<JobStatus>,
    id: JobId,
    timeout: Duration,
) -> QueueResult<Job> {
    let settled = tokio::time::timeout(timeout, async {
        // Map away the borrow guard so it is not held across an await.
        receiver.wait_for(JobStatus::is_terminal).await.map(|_| ())
    })
    .await;
    match settled {
        Ok(Ok(())) => store.job(id).await,
        Ok(Err(_closed)) => Err(QueueError::new(QueueErrorKind::Shutdown)),
        Err(_elapsed) => Err(QueueError::new(QueueErrorKind::WaitTimeout(id.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryJobStore;
    use serde_json::json;

    fn broker() -> JobBroker {
        JobBroker::new(Arc::new(InMemoryJobStore::new()))
    }

    #[tokio::test]
    async fn enqueue_stamps_policy_attempts() {
        let broker = broker().with_policy(RetryPolicy::new(
            5,
            Duration::from_millis(1),
            Duration::from_millis(10),
        ));
        let handle = broker.enqueue("q", "label", &json!({"a": 1})).await.unwrap();
        let job = broker.job(handle.id()).await.unwrap();
        assert_eq!(*job.max_attempts(), 5);
        assert_eq!(*job.status(), JobStatus::Waiting);
    }

    #[tokio::test]
    async fn wait_returns_completed_job() {
        let broker = broker();
        let store = broker.store();
        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let id = handle.id();

        let waiter = tokio::spawn(handle.wait(Duration::from_secs(5)));
        store
            .claim_next("q", Duration::from_secs(30))
            .await
            .unwrap()
            .unwrap();
        store.mark_completed(id).await.unwrap();

        let job = waiter.await.unwrap().unwrap();
        assert_eq!(*job.status(), JobStatus::Completed);
        assert!(job.clone().ensure_completed().is_ok());
    }

    #[tokio::test]
    async fn wait_times_out_on_stuck_job() {
        let broker = broker();
        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let err = handle.wait(Duration::from_millis(20)).await.unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[tokio::test]
    async fn wait_returns_dead_lettered_job() {
        let broker = broker();
        let store = broker.store();
        let handle = broker.enqueue("q", "label", &json!(null)).await.unwrap();
        let id = handle.id();

        store
            .claim_next("q", Duration::from_secs(30))
            .await
            .unwrap()
            .unwrap();
        store.mark_failed(id, "boom", None).await.unwrap();

        let job = handle.wait(Duration::from_secs(5)).await.unwrap();
        assert!(job.is_finished());
        let err = job.ensure_completed().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
