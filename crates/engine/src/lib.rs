//! Job execution engine: runner, registry, and the deferred worker.
//!
//! The engine sequences pipeline tasks over a job context, tracks job state
//! (`pending → running → {succeeded, failed}`), and hands deferred jobs to
//! an in-process worker loop over a typed message boundary. Jobs run
//! exactly once: there is no cancellation and no automatic retry — a host
//! that loses interest simply stops waiting for the result.
//!
//! The in-process [`JobRegistry`] keeps every entry for the lifetime of
//! the process; nothing evicts a job after its result has been retrieved.
//! A deployment with unbounded submission volume needs a durable registry
//! implementation with its own retention policy behind the same interface.

pub mod registry;
pub mod runner;
pub mod worker;

pub use registry::{JobId, JobRegistry, JobResult, JobStatus, ResultOutcome, StatusView};
pub use worker::{ExecutionMode, JobEngine, JobMessage, JobWorker};
