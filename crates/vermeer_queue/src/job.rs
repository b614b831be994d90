use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vermeer_error::{QueueError, QueueErrorKind, QueueResult};

/// Identifies a queued job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a job sits in its lifecycle.
///
/// `Failed` is not terminal: it records a failed attempt that has a retry
/// scheduled. Only `Completed` and `DeadLettered` are settled states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Enqueued and claimable once its `run_at` time arrives.
    Waiting,
    /// Claimed by a worker that holds a lease on it.
    Active,
    /// Finished successfully.
    Completed,
    /// The last attempt failed; another is scheduled.
    Failed { error: String },
    /// Failed permanently. No further attempts will be made.
    DeadLettered { error: String, attempts: u32 },
}

impl JobStatus {
    /// True for `Completed` and `DeadLettered`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::DeadLettered { .. })
    }

    /// The error recorded on the most recent failure, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } | Self::DeadLettered { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            Self::DeadLettered { error, attempts } => {
                write!(f, "dead-lettered after {attempts} attempts: {error}")
            }
        }
    }
}

/// A unit of queued work.
///
/// Jobs carry an opaque JSON payload; handlers deserialize it with
/// [`payload_as`](Self::payload_as). The `attempts` counter counts
/// deliveries, so a job being worked on for the first time has
/// `attempts == 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Job {
    pub(crate) id: JobId,
    /// Queue this job belongs to.
    pub(crate) queue: String,
    /// Operator-facing label, e.g. the id of the entity being processed.
    pub(crate) name: String,
    pub(crate) payload: serde_json::Value,
    pub(crate) status: JobStatus,
    /// Deliveries started, including the current one when active.
    pub(crate) attempts: u32,
    /// Deliveries allowed before dead-lettering.
    pub(crate) max_attempts: u32,
    /// Earliest time the job may be claimed.
    pub(crate) run_at: DateTime<Utc>,
    /// While active, when the current worker's claim expires.
    pub(crate) lease_until: Option<DateTime<Utc>>,
    /// Append-only progress log written by handlers.
    pub(crate) log: Vec<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        queue: impl Into<String>,
        name: impl Into<String>,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            queue: queue.into(),
            name: name.into(),
            payload,
            status: JobStatus::Waiting,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            run_at: now,
            lease_until: None,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Deserializes the payload into a typed value.
    #[track_caller]
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> QueueResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            QueueError::new(QueueErrorKind::Payload(format!(
                "job {} in {}: {e}",
                self.id, self.queue
            )))
        })
    }

    /// True once no further state changes can occur.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Converts a dead-lettered job into an error, passing everything else
    /// through.
    #[track_caller]
    pub fn ensure_completed(self) -> QueueResult<Self> {
        match &self.status {
            JobStatus::DeadLettered { error, .. } => {
                Err(QueueError::new(QueueErrorKind::JobFailed {
                    job: self.id.to_string(),
                    error: error.clone(),
                }))
            }
            _ => Ok(self),
        }
    }

    /// True while a retry is possible after another failure.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Whether a worker may claim this job right now.
    pub(crate) fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match &self.status {
            JobStatus::Waiting | JobStatus::Failed { .. } => self.run_at <= now,
            JobStatus::Active => self.lease_until.is_some_and(|lease| lease < now),
            _ => false,
        }
    }

    /// Starts a delivery: bumps the attempt counter and takes a lease.
    pub(crate) fn begin_attempt(&mut self, lease_until: DateTime<Utc>) {
        self.attempts += 1;
        self.status = JobStatus::Active;
        self.lease_until = Some(lease_until);
        self.updated_at = Utc::now();
    }

    pub(crate) fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    /// Records a failed attempt. With `retry_at` the job becomes claimable
    /// again at that time; without it the job is dead-lettered.
    pub(crate) fn fail(&mut self, error: &str, retry_at: Option<DateTime<Utc>>) {
        self.status = match retry_at {
            Some(at) => {
                self.run_at = at;
                JobStatus::Failed {
                    error: error.to_string(),
                }
            }
            None => JobStatus::DeadLettered {
                error: error.to_string(),
                attempts: self.attempts,
            },
        };
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    pub(crate) fn append_log(&mut self, line: &str) {
        self.log.push(line.to_string());
        self.updated_at = Utc::now();
    }
}

/// Per-queue counts for inspection and logging.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct QueueStats {
    waiting: usize,
    active: usize,
    completed: usize,
    failed: usize,
    dead_lettered: usize,
}

impl QueueStats {
    pub(crate) fn tally(&mut self, status: &JobStatus) {
        match status {
            JobStatus::Waiting => self.waiting += 1,
            JobStatus::Active => self.active += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed { .. } => self.failed += 1,
            JobStatus::DeadLettered { .. } => self.dead_lettered += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_job_starts_waiting_with_zero_attempts() {
        let job = Job::new("q", "label", json!({"k": 1}), 3);
        assert_eq!(*job.status(), JobStatus::Waiting);
        assert_eq!(*job.attempts(), 0);
        assert!(job.has_attempts_left());
        assert!(!job.is_finished());
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let job = Job::new("q", "label", json!(null), 0);
        assert_eq!(*job.max_attempts(), 1);
    }

    #[test]
    fn fail_without_retry_dead_letters() {
        let mut job = Job::new("q", "label", json!(null), 3);
        job.begin_attempt(Utc::now());
        job.fail("boom", None);
        assert!(job.is_finished());
        assert_eq!(job.status().error(), Some("boom"));
        match job.status() {
            JobStatus::DeadLettered { attempts, .. } => assert_eq!(*attempts, 1),
            other => panic!("expected dead letter, got {other:?}"),
        }
    }

    #[test]
    fn fail_with_retry_schedules_and_stays_unfinished() {
        let mut job = Job::new("q", "label", json!(null), 3);
        job.begin_attempt(Utc::now());
        let retry_at = Utc::now() + chrono::Duration::seconds(30);
        job.fail("transient", Some(retry_at));
        assert!(!job.is_finished());
        assert_eq!(*job.run_at(), retry_at);
        assert!(!job.is_claimable(Utc::now()));
        assert!(job.is_claimable(retry_at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn expired_lease_makes_active_job_claimable() {
        let mut job = Job::new("q", "label", json!(null), 3);
        job.begin_attempt(Utc::now() - chrono::Duration::seconds(1));
        assert!(job.is_claimable(Utc::now()));
    }

    #[test]
    fn payload_round_trips_through_json() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Payload {
            id: u32,
        }
        let job = Job::new("q", "label", json!({"id": 7}), 3);
        let payload: Payload = job.payload_as().unwrap();
        assert_eq!(payload, Payload { id: 7 });

        let wrong: QueueResult<Vec<String>> = job.payload_as();
        assert!(wrong.is_err());
    }
}
