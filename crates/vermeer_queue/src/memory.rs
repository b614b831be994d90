use crate::{Job, JobId, JobStatus, JobStore, QueueStats};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use vermeer_error::{QueueError, QueueErrorKind, QueueResult};

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    /// Enqueue order per queue. Settled jobs are swept out lazily.
    fifo: HashMap<String, VecDeque<JobId>>,
    watchers: HashMap<JobId, watch::Sender<JobStatus>>,
}

impl Inner {
    fn notify(&self, job: &Job) {
        if let Some(tx) = self.watchers.get(&job.id) {
            tx.send_replace(job.status.clone());
        }
    }

    #[track_caller]
    fn job_mut(&mut self, id: JobId) -> QueueResult<&mut Job> {
        self.jobs
            .get_mut(&id)
            .ok_or_else(|| QueueError::new(QueueErrorKind::JobNotFound(id.to_string())))
    }
}

/// In-process [`JobStore`] backed by a shared map.
///
/// Claim selection walks jobs in enqueue order, so delivery within a queue
/// is first-in-first-out among jobs whose `run_at` has arrived. Clones
/// share the same underlying state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn enqueue(&self, job: Job) -> QueueResult<JobId> {
        let mut inner = self.inner.lock().await;
        let id = job.id;
        let (tx, _rx) = watch::channel(job.status.clone());
        inner.watchers.insert(id, tx);
        inner.fifo.entry(job.queue.clone()).or_default().push_back(id);
        inner.jobs.insert(id, job);
        Ok(id)
    }

    async fn claim_next(&self, queue: &str, lease: Duration) -> QueueResult<Option<Job>> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let candidates: Vec<JobId> = inner
            .fifo
            .get(queue)
            .map(|deque| deque.iter().copied().collect())
            .unwrap_or_default();

        let mut claimed = None;
        for id in candidates {
            let Some(job) = inner.jobs.get_mut(&id) else {
                continue;
            };
            if job.is_finished() || !job.is_claimable(now) {
                continue;
            }
            // A job whose lease expired mid-delivery already consumed that
            // attempt. Out of attempts, it dead-letters instead of being
            // handed out again.
            if matches!(job.status, JobStatus::Active) && !job.has_attempts_left() {
                job.fail("lease expired on final attempt", None);
                let settled = job.clone();
                inner.notify(&settled);
                continue;
            }
            job.begin_attempt(now + lease);
            let job = job.clone();
            inner.notify(&job);
            claimed = Some(job);
            break;
        }

        let jobs = &inner.jobs;
        let settled: Vec<JobId> = inner
            .fifo
            .get(queue)
            .map(|deque| {
                deque
                    .iter()
                    .copied()
                    .filter(|id| jobs.get(id).is_none_or(Job::is_finished))
                    .collect()
            })
            .unwrap_or_default();
        if !settled.is_empty() {
            if let Some(deque) = inner.fifo.get_mut(queue) {
                deque.retain(|id| !settled.contains(id));
            }
        }

        Ok(claimed)
    }

    async fn mark_completed(&self, id: JobId) -> QueueResult<Job> {
        let mut inner = self.inner.lock().await;
        let job = inner.job_mut(id)?;
        job.complete();
        let job = job.clone();
        inner.notify(&job);
        Ok(job)
    }

    async fn mark_failed(
        &self,
        id: JobId,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> QueueResult<Job> {
        let mut inner = self.inner.lock().await;
        let job = inner.job_mut(id)?;
        job.fail(error, retry_at);
        let job = job.clone();
        inner.notify(&job);
        Ok(job)
    }

    async fn append_log(&self, id: JobId, line: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().await;
        inner.job_mut(id)?.append_log(line);
        Ok(())
    }

    async fn job(&self, id: JobId) -> QueueResult<Job> {
        let inner = self.inner.lock().await;
        inner
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| QueueError::new(QueueErrorKind::JobNotFound(id.to_string())))
    }

    async fn subscribe(&self, id: JobId) -> QueueResult<watch::Receiver<JobStatus>> {
        let inner = self.inner.lock().await;
        inner
            .watchers
            .get(&id)
            .map(watch::Sender::subscribe)
            .ok_or_else(|| QueueError::new(QueueErrorKind::JobNotFound(id.to_string())))
    }

    async fn stats(&self, queue: &str) -> QueueResult<QueueStats> {
        let inner = self.inner.lock().await;
        let mut stats = QueueStats::default();
        for job in inner.jobs.values().filter(|j| j.queue == queue) {
            stats.tally(&job.status);
        }
        Ok(stats)
    }

    async fn dead_letters(&self, queue: &str) -> QueueResult<Vec<Job>> {
        let inner = self.inner.lock().await;
        let mut dead: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.queue == queue && matches!(j.status, JobStatus::DeadLettered { .. }))
            .cloned()
            .collect();
        dead.sort_by_key(|j| j.created_at);
        Ok(dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEASE: Duration = Duration::from_secs(30);

    fn job(queue: &str, name: &str) -> Job {
        Job::new(queue, name, json!({"n": name}), 3)
    }

    #[tokio::test]
    async fn claims_in_enqueue_order() {
        let store = InMemoryJobStore::new();
        store.enqueue(job("q", "a")).await.unwrap();
        store.enqueue(job("q", "b")).await.unwrap();
        store.enqueue(job("q", "c")).await.unwrap();

        let first = store.claim_next("q", LEASE).await.unwrap().unwrap();
        let second = store.claim_next("q", LEASE).await.unwrap().unwrap();
        assert_eq!(first.name(), "a");
        assert_eq!(second.name(), "b");
        assert_eq!(*first.attempts(), 1);
        assert_eq!(*first.status(), JobStatus::Active);
    }

    #[tokio::test]
    async fn claim_skips_other_queues_and_empty() {
        let store = InMemoryJobStore::new();
        store.enqueue(job("other", "a")).await.unwrap();
        assert!(store.claim_next("q", LEASE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scheduled_retry_is_not_claimable_until_due() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        store.claim_next("q", LEASE).await.unwrap().unwrap();

        let retry_at = Utc::now() + chrono::Duration::hours(1);
        store.mark_failed(id, "transient", Some(retry_at)).await.unwrap();
        assert!(store.claim_next("q", LEASE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn due_retry_is_redelivered_with_bumped_attempts() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        store.claim_next("q", LEASE).await.unwrap().unwrap();
        store
            .mark_failed(id, "transient", Some(Utc::now()))
            .await
            .unwrap();

        let redelivered = store.claim_next("q", LEASE).await.unwrap().unwrap();
        assert_eq!(*redelivered.id(), id);
        assert_eq!(*redelivered.attempts(), 2);
    }

    #[tokio::test]
    async fn expired_lease_redelivers_job() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        store.claim_next("q", Duration::ZERO).await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(2)).await;
        let redelivered = store.claim_next("q", LEASE).await.unwrap().unwrap();
        assert_eq!(*redelivered.id(), id);
        assert_eq!(*redelivered.attempts(), 2);
    }

    #[tokio::test]
    async fn expired_lease_on_final_attempt_dead_letters() {
        let store = InMemoryJobStore::new();
        let id = store
            .enqueue(Job::new("q", "a", json!(null), 1))
            .await
            .unwrap();
        store.claim_next("q", Duration::ZERO).await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(store.claim_next("q", LEASE).await.unwrap().is_none());
        let job = store.job(id).await.unwrap();
        assert!(matches!(job.status(), JobStatus::DeadLettered { .. }));
        assert_eq!(store.dead_letters("q").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscriber_observes_completion() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        let mut rx = store.subscribe(id).await.unwrap();
        assert_eq!(*rx.borrow(), JobStatus::Waiting);

        store.claim_next("q", LEASE).await.unwrap().unwrap();
        store.mark_completed(id).await.unwrap();
        rx.wait_for(JobStatus::is_terminal).await.unwrap();
        assert_eq!(*rx.borrow(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn late_subscriber_sees_terminal_state() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        store.claim_next("q", LEASE).await.unwrap().unwrap();
        store.mark_completed(id).await.unwrap();

        let rx = store.subscribe(id).await.unwrap();
        assert_eq!(*rx.borrow(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let store = InMemoryJobStore::new();
        store.enqueue(job("q", "a")).await.unwrap();
        let b = store.enqueue(job("q", "b")).await.unwrap();
        store.enqueue(job("q", "c")).await.unwrap();

        store.claim_next("q", LEASE).await.unwrap();
        store.mark_completed(b).await.unwrap();

        let stats = store.stats("q").await.unwrap();
        assert_eq!(*stats.active(), 1);
        assert_eq!(*stats.completed(), 1);
        assert_eq!(*stats.waiting(), 1);
    }

    #[tokio::test]
    async fn log_lines_accumulate() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(job("q", "a")).await.unwrap();
        store.append_log(id, "first").await.unwrap();
        store.append_log(id, "second").await.unwrap();
        let job = store.job(id).await.unwrap();
        assert_eq!(job.log(), &["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn unknown_job_errors() {
        let store = InMemoryJobStore::new();
        let missing = JobId::new();
        assert!(store.job(missing).await.is_err());
        assert!(store.subscribe(missing).await.is_err());
    }
}
