//! The mutable state threaded through a pipeline run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use presenta_core::error::CoreError;
use presenta_core::identity::UserSnapshot;
use presenta_core::record::RecordData;
use presenta_core::scratch::ScratchSpace;

/// Per-job state carried across the task chain.
///
/// A context is owned by exactly one job. It is serializable so deferred
/// jobs can cross the submission/worker boundary; the scratch space handle
/// itself is not serialized — only its directory and root are, and the
/// handle is reattached (via [`ScratchSpace::reopen`]) on first use after
/// deserialization. The reopen rescans existing filenames, which keeps
/// allocation collision-safe across the handoff.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobContext {
    /// Snapshot of the record this presentation runs over.
    pub record: RecordData,
    /// Snapshot of the submitting principal.
    pub user: UserSnapshot,
    /// Snapshot of the submitting request's headers (credentials excluded).
    pub request_headers: BTreeMap<String, String>,
    /// Free-form data passed task-to-task; each task may read and
    /// overwrite it. The final value is mined for the [`ResultPayload`].
    pub payload: serde_json::Value,

    scratch_root: PathBuf,
    scratch_dir: PathBuf,
    #[serde(skip)]
    scratch: Option<ScratchSpace>,
}

impl JobContext {
    /// Create a context for a new job, allocating its scratch directory.
    ///
    /// This is the only place a job's scratch space is created; everything
    /// afterwards reopens the same directory.
    pub fn new(
        record: RecordData,
        user: UserSnapshot,
        request_headers: BTreeMap<String, String>,
        scratch_root: &Path,
    ) -> Result<Self, CoreError> {
        let scratch = ScratchSpace::create(scratch_root)?;
        Ok(Self {
            record,
            user,
            request_headers,
            payload: serde_json::Value::Null,
            scratch_root: scratch.root().to_path_buf(),
            scratch_dir: scratch.dir().to_path_buf(),
            scratch: Some(scratch),
        })
    }

    /// The job's scratch space, reattached if this context crossed a
    /// serialization boundary.
    pub fn scratch(&mut self) -> Result<&mut ScratchSpace, CoreError> {
        if self.scratch.is_none() {
            let reopened = ScratchSpace::reopen(&self.scratch_dir, &self.scratch_root)?;
            self.scratch = Some(reopened);
        }
        Ok(self
            .scratch
            .as_mut()
            .expect("scratch space attached above"))
    }

    /// The scratch directory path (valid even before reattachment).
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }
}

/// Result of a successfully completed presentation, as left in the final
/// payload by the last task: a file inside scratch plus the metadata the
/// download endpoint needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// Path of the artifact, relative to the job's scratch directory.
    pub file: String,
    /// Served verbatim as `Content-Type`.
    pub mimetype: String,
    /// Suggested download filename (sanitized before hitting a header).
    pub filename: String,
}

impl ResultPayload {
    /// Extract a result payload from a final task payload, if the tasks
    /// produced a file-shaped result.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
