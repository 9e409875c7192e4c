//! Job status and result bookkeeping.
//!
//! The registry is an explicit object injected into request-handling
//! contexts — never an ambient global. Every lookup is ownership-checked:
//! a requester who does not own a job sees exactly what they would see for
//! a job that does not exist (`unknown`), so job ids cannot be enumerated
//! or probed for existence.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use presenta_core::identity::UserSnapshot;

/// Opaque job handle returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Job lifecycle states.
///
/// `Pending` exists only for deferred jobs (assigned at submission, before
/// a worker picks the job up); synchronous jobs start at `Running`.
/// `Succeeded` and `Failed` are absorbing. `Unknown` is what non-owners
/// and lookups of nonexistent ids observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

/// Completed-job artifact: an absolute path inside the job's scratch
/// directory plus the metadata the download endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub path: PathBuf,
    pub mimetype: String,
    pub filename: String,
}

/// Owner-visible status projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: JobStatus,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Outcome of waiting for a job's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOutcome {
    /// The job succeeded and produced a downloadable artifact.
    Ready(JobResult),
    /// The job reached a terminal state without a downloadable artifact
    /// (it failed, or its pipeline produced no file-shaped payload).
    NoResult,
    /// Nonexistent job, or the requester is not the owner. The two are
    /// deliberately indistinguishable.
    Unknown,
}

/// Failure diagnostics kept for operators; never routed to callers.
#[derive(Debug, Clone)]
pub struct JobDiagnostics {
    pub reason: String,
    /// The task payload captured at the time of the failure.
    pub payload: serde_json::Value,
}

struct JobEntry {
    owner: String,
    status: JobStatus,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    result: Option<JobResult>,
    diagnostics: Option<JobDiagnostics>,
    notify: watch::Sender<JobStatus>,
}

impl JobEntry {
    fn owned_by(&self, requester: &UserSnapshot) -> bool {
        requester.id.as_deref() == Some(self.owner.as_str())
    }
}

/// In-process registry of jobs keyed by [`JobId`].
///
/// Entries are never evicted: the map grows with every submission and is
/// reclaimed only when the process exits. See the crate docs for the
/// retention caveat.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a job entry owned by `owner`.
    ///
    /// `initial` is [`JobStatus::Pending`] for deferred jobs and
    /// [`JobStatus::Running`] for synchronous ones.
    pub async fn create(&self, owner: &str, initial: JobStatus) -> JobId {
        let job_id = JobId::new();
        let now = Utc::now();
        let (notify, _) = watch::channel(initial);

        self.jobs.write().await.insert(
            job_id,
            JobEntry {
                owner: owner.to_string(),
                status: initial,
                created: now,
                modified: now,
                result: None,
                diagnostics: None,
                notify,
            },
        );

        tracing::info!(job_id = %job_id, owner, status = initial.as_str(), "Job created");
        job_id
    }

    /// Transition a pending job to running. No-op on terminal entries.
    pub async fn mark_running(&self, job_id: JobId) {
        self.transition(job_id, JobStatus::Running, None, None).await;
    }

    /// Record a terminal success, with or without an artifact.
    pub async fn complete(&self, job_id: JobId, result: Option<JobResult>) {
        self.transition(job_id, JobStatus::Succeeded, result, None).await;
    }

    /// Record a terminal failure, keeping the reason and the payload at
    /// failure time for diagnostics.
    pub async fn fail(&self, job_id: JobId, reason: &str, payload: serde_json::Value) {
        self.transition(
            job_id,
            JobStatus::Failed,
            None,
            Some(JobDiagnostics {
                reason: reason.to_string(),
                payload,
            }),
        )
        .await;
    }

    async fn transition(
        &self,
        job_id: JobId,
        status: JobStatus,
        result: Option<JobResult>,
        diagnostics: Option<JobDiagnostics>,
    ) {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(&job_id) else {
            tracing::warn!(job_id = %job_id, "Transition on unknown job ignored");
            return;
        };
        if entry.status.is_terminal() {
            tracing::warn!(
                job_id = %job_id,
                from = entry.status.as_str(),
                to = status.as_str(),
                "Transition on terminal job ignored",
            );
            return;
        }

        entry.status = status;
        entry.modified = Utc::now();
        if result.is_some() {
            entry.result = result;
        }
        if diagnostics.is_some() {
            entry.diagnostics = diagnostics;
        }
        let _ = entry.notify.send(status);

        tracing::info!(job_id = %job_id, status = status.as_str(), "Job state changed");
    }

    /// Owner-checked status lookup.
    ///
    /// Returns `None` — indistinguishably — for nonexistent jobs and for
    /// jobs owned by someone else.
    pub async fn status(&self, job_id: JobId, requester: &UserSnapshot) -> Option<StatusView> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(&job_id)?;
        if !entry.owned_by(requester) {
            return None;
        }
        Some(StatusView {
            status: entry.status,
            created: entry.created,
            modified: entry.modified,
        })
    }

    /// Block until the job reaches a terminal state, then report its
    /// result. Same ownership hiding as [`status`].
    ///
    /// Callers wanting a bounded wait wrap this in `tokio::time::timeout`.
    ///
    /// [`status`]: JobRegistry::status
    pub async fn await_result(&self, job_id: JobId, requester: &UserSnapshot) -> ResultOutcome {
        let mut updates = {
            let jobs = self.jobs.read().await;
            let Some(entry) = jobs.get(&job_id) else {
                return ResultOutcome::Unknown;
            };
            if !entry.owned_by(requester) {
                return ResultOutcome::Unknown;
            }
            entry.notify.subscribe()
        };

        loop {
            if updates.borrow().is_terminal() {
                break;
            }
            if updates.changed().await.is_err() {
                // Registry entry dropped while waiting.
                return ResultOutcome::Unknown;
            }
        }

        let jobs = self.jobs.read().await;
        let Some(entry) = jobs.get(&job_id) else {
            return ResultOutcome::Unknown;
        };
        match (entry.status, &entry.result) {
            (JobStatus::Succeeded, Some(result)) => ResultOutcome::Ready(result.clone()),
            _ => ResultOutcome::NoResult,
        }
    }

    /// Failure diagnostics for operators. Not ownership-checked because it
    /// is never routed through the HTTP surface.
    pub async fn diagnostics(&self, job_id: JobId) -> Option<JobDiagnostics> {
        self.jobs.read().await.get(&job_id)?.diagnostics.clone()
    }
}
