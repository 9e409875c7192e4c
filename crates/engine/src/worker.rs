//! Job submission and the deferred worker loop.
//!
//! Deferred jobs cross a typed message boundary: a [`JobMessage`] carries
//! the pipeline name and the serialized job context over an mpsc channel to
//! the [`JobWorker`]. The message itself is serializable, so swapping the
//! in-process channel for an out-of-process queue is a transport change,
//! not a contract change.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use presenta_core::error::CoreError;
use presenta_core::identity::UserSnapshot;
use presenta_core::permissions::PermissionEvaluator;
use presenta_core::record::RecordStore;
use presenta_pipeline::{JobContext, PipelineRegistry};

use crate::registry::{JobId, JobRegistry, JobStatus};
use crate::runner::execute_job;

/// Default depth of the submission queue.
const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Where a submitted job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run every task inline and return only after the terminal state.
    /// Acceptable only for short pipelines.
    Synchronous,
    /// Hand the serialized context to the worker and return immediately.
    Deferred,
}

/// The typed "submit job" message handed to the worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: JobId,
    pub pipeline: String,
    /// JSON-serialized [`JobContext`].
    pub context: String,
}

/// Front end of the engine: permission-gated job submission.
pub struct JobEngine {
    scratch_root: PathBuf,
    pipelines: Arc<PipelineRegistry>,
    jobs: Arc<JobRegistry>,
    permissions: Arc<dyn PermissionEvaluator>,
    records: Arc<dyn RecordStore>,
    tx: mpsc::Sender<JobMessage>,
}

impl JobEngine {
    /// Build an engine and its worker half.
    ///
    /// The caller spawns [`JobWorker::run`] on the runtime and keeps the
    /// cancellation token for shutdown.
    pub fn new(
        scratch_root: PathBuf,
        pipelines: Arc<PipelineRegistry>,
        jobs: Arc<JobRegistry>,
        permissions: Arc<dyn PermissionEvaluator>,
        records: Arc<dyn RecordStore>,
    ) -> (Arc<Self>, JobWorker) {
        let (tx, rx) = mpsc::channel(DEFAULT_QUEUE_DEPTH);

        let engine = Arc::new(Self {
            scratch_root,
            pipelines: Arc::clone(&pipelines),
            jobs: Arc::clone(&jobs),
            permissions,
            records,
            tx,
        });
        let worker = JobWorker {
            rx,
            pipelines,
            jobs,
        };
        (engine, worker)
    }

    /// Submit a presentation run over `record_id` on behalf of `user`.
    ///
    /// Ordering matters here: the pipeline is resolved, the permission set
    /// checked, and the record looked up before any per-job state exists —
    /// a denial or lookup failure leaves no scratch directory and no
    /// registry entry behind.
    pub async fn submit(
        &self,
        presentation: &str,
        record_id: &str,
        user: UserSnapshot,
        request_headers: BTreeMap<String, String>,
        mode: ExecutionMode,
    ) -> Result<JobId, CoreError> {
        let pipeline = self.pipelines.get(presentation)?;
        self.permissions.check(pipeline.permissions(), &user)?;

        // The permission gate guarantees an authenticated principal.
        let owner = user.id.clone().ok_or_else(|| {
            CoreError::Internal("Permission gate admitted an anonymous principal".to_string())
        })?;

        let record = self.records.get_record(record_id).await?;
        let ctx = JobContext::new(record, user, request_headers, &self.scratch_root)?;

        tracing::info!(
            presentation,
            record_id = %ctx.record.id,
            owner = %owner,
            mode = ?mode,
            "Job submitted",
        );

        match mode {
            ExecutionMode::Synchronous => {
                let job_id = self.jobs.create(&owner, JobStatus::Running).await;
                execute_job(job_id, pipeline, ctx, &self.jobs).await;
                Ok(job_id)
            }
            ExecutionMode::Deferred => {
                let job_id = self.jobs.create(&owner, JobStatus::Pending).await;
                let context = serde_json::to_string(&ctx)
                    .map_err(|e| CoreError::Internal(format!("Context serialization: {e}")))?;

                let message = JobMessage {
                    job_id,
                    pipeline: presentation.to_string(),
                    context,
                };
                if self.tx.send(message).await.is_err() {
                    self.jobs
                        .fail(job_id, "Job queue is closed", serde_json::Value::Null)
                        .await;
                    return Err(CoreError::Internal("Job queue is closed".to_string()));
                }
                Ok(job_id)
            }
        }
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    pub fn pipelines(&self) -> &Arc<PipelineRegistry> {
        &self.pipelines
    }
}

/// Consumer half of the deferred boundary.
///
/// A single long-lived loop that receives [`JobMessage`]s and spawns one
/// task per job. Distinct jobs run concurrently, each in its own scratch
/// directory; tasks within a job stay strictly ordered inside
/// [`execute_job`].
pub struct JobWorker {
    rx: mpsc::Receiver<JobMessage>,
    pipelines: Arc<PipelineRegistry>,
    jobs: Arc<JobRegistry>,
}

impl JobWorker {
    /// Run until the cancellation token fires or the submission side is
    /// dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Job worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job worker shutting down");
                    break;
                }
                message = self.rx.recv() => {
                    match message {
                        Some(message) => {
                            let pipelines = Arc::clone(&self.pipelines);
                            let jobs = Arc::clone(&self.jobs);
                            tokio::spawn(async move {
                                handle_message(message, pipelines, jobs).await;
                            });
                        }
                        None => {
                            tracing::info!("Submission channel closed, job worker stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Execute one deferred job: deserialize the context, reattach scratch on
/// first use, and run the ordered task chain.
async fn handle_message(
    message: JobMessage,
    pipelines: Arc<PipelineRegistry>,
    jobs: Arc<JobRegistry>,
) {
    let JobMessage {
        job_id,
        pipeline,
        context,
    } = message;

    let pipeline = match pipelines.get(&pipeline) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Pipeline vanished between submit and pickup");
            jobs.fail(job_id, &e.to_string(), serde_json::Value::Null).await;
            return;
        }
    };

    let ctx: JobContext = match serde_json::from_str(&context) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Context deserialization failed");
            jobs.fail(
                job_id,
                &format!("Context deserialization: {e}"),
                serde_json::Value::Null,
            )
            .await;
            return;
        }
    };

    jobs.mark_running(job_id).await;
    execute_job(job_id, pipeline, ctx, &jobs).await;
}
