//! Ordered task execution over a job context.

use std::sync::Arc;

use presenta_core::CoreError;
use presenta_pipeline::context::ResultPayload;
use presenta_pipeline::registry::Pipeline;
use presenta_pipeline::task::TaskError;
use presenta_pipeline::JobContext;

use crate::registry::{JobId, JobRegistry, JobResult};

/// Execute every task of `pipeline` in registration order and record the
/// terminal state in the registry.
///
/// The job entry must already be in the `running` state. Tasks within one
/// job run strictly sequentially; an abort or error halts the chain
/// immediately and the payload at that moment is preserved in the job's
/// diagnostics. There is no partial resumption — a failed job is only ever
/// re-run by submitting a fresh job from task one.
pub async fn execute_job(
    job_id: JobId,
    pipeline: Arc<Pipeline>,
    mut ctx: JobContext,
    jobs: &JobRegistry,
) {
    for task in pipeline.tasks() {
        tracing::debug!(job_id = %job_id, task = task.name(), "Task started");

        match task.run(&mut ctx).await {
            Ok(()) => {
                tracing::debug!(job_id = %job_id, task = task.name(), "Task finished");
            }
            Err(TaskError::Abort(reason)) => {
                tracing::warn!(
                    job_id = %job_id,
                    task = task.name(),
                    reason = %reason,
                    "Task aborted the pipeline",
                );
                let err = CoreError::TaskAbort(reason);
                jobs.fail(job_id, &err.to_string(), ctx.payload.clone()).await;
                return;
            }
            Err(TaskError::Failed(err)) => {
                // Cause retained for logs, never exposed verbatim.
                tracing::error!(
                    job_id = %job_id,
                    task = task.name(),
                    error = %err,
                    "Task failed",
                );
                jobs.fail(job_id, &err.to_string(), ctx.payload.clone()).await;
                return;
            }
        }
    }

    match extract_result(&mut ctx) {
        Ok(result) => {
            tracing::info!(
                job_id = %job_id,
                has_artifact = result.is_some(),
                "Pipeline completed",
            );
            jobs.complete(job_id, result).await;
        }
        Err(err) => {
            // A result payload pointing outside scratch is a defect, never
            // served.
            tracing::error!(job_id = %job_id, error = %err, "Result resolution failed");
            jobs.fail(job_id, &err.to_string(), ctx.payload.clone()).await;
        }
    }
}

/// Resolve the final payload into a servable artifact, enforcing scratch
/// containment on the payload's file path.
fn extract_result(ctx: &mut JobContext) -> Result<Option<JobResult>, CoreError> {
    let Some(payload) = ResultPayload::from_value(&ctx.payload) else {
        return Ok(None);
    };

    let path = ctx.scratch()?.full_path(&payload.file)?;
    Ok(Some(JobResult {
        path,
        mimetype: payload.mimetype,
        filename: payload.filename,
    }))
}
