use std::path::PathBuf;

/// Domain error taxonomy shared by every crate in the workspace.
///
/// The HTTP status mapping lives in `presenta-api`; this enum only encodes
/// the distinctions the domain cares about. Note that `NotAuthenticated`
/// vs `PermissionDenied` is only ever surfaced at submission time — job
/// lookups hide ownership failures behind an `unknown` status instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No identity was presented where one is required.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// An authenticated identity lacks a required permission.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No pipeline is registered under the requested presentation name.
    #[error("Unknown presentation: {name}")]
    PresentationNotFound { name: String },

    /// The referenced record does not exist in the host record store.
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// A path resolution attempt escaped the job's scratch directory.
    /// Always treated as a defect; never silently corrected.
    #[error("Path escapes the scratch directory: {path}")]
    OutsideScratch { path: PathBuf },

    /// A task explicitly halted the pipeline.
    #[error("Task aborted: {0}")]
    TaskAbort(String),

    /// Validation failed on caller-supplied input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An underlying filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything unexpected. The message is kept for logs, not for callers.
    #[error("Internal error: {0}")]
    Internal(String),
}
