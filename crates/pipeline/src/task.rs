//! The task trait: one pipeline step.

use presenta_core::error::CoreError;

use crate::context::JobContext;

/// How a task run can fail.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task explicitly halted the pipeline (e.g. an unreadable
    /// intermediate file). No subsequent task runs; the job fails and the
    /// payload captured at abort time is preserved for diagnostics.
    #[error("Task aborted: {0}")]
    Abort(String),

    /// The task failed with a domain error. Mapped to a failed job; the
    /// cause is retained for logs but not exposed verbatim to the caller.
    #[error(transparent)]
    Failed(#[from] CoreError),
}

impl TaskError {
    pub fn abort(reason: impl Into<String>) -> Self {
        TaskError::Abort(reason.into())
    }
}

/// A polymorphic unit of work: context in, mutated context out, or abort.
///
/// Tasks are user-supplied and pluggable; the engine only standardizes how
/// they are sequenced and isolated. Pipelines are never partially resumed,
/// so a task must be safe to re-run only in the sense that a fresh job may
/// restart the whole pipeline from task one.
#[async_trait::async_trait]
pub trait PipelineTask: Send + Sync {
    /// Stable task name, used in logs and scratch file suffixes.
    fn name(&self) -> &str;

    /// Execute this step over the job context.
    async fn run(&self, ctx: &mut JobContext) -> Result<(), TaskError>;
}
