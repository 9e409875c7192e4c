//! Tasks, pipelines, and the job context.
//!
//! A presentation is a named, ordered, immutable sequence of
//! [`task::PipelineTask`]s registered in a [`registry::PipelineRegistry`].
//! Each run threads a [`context::JobContext`] through the tasks in order.
//! Pipelines are registered in code against strongly-typed task values —
//! there is no string-based dynamic loading.

pub mod context;
pub mod example;
pub mod registry;
pub mod task;

pub use context::{JobContext, ResultPayload};
pub use registry::{Pipeline, PipelineRegistry};
pub use task::{PipelineTask, TaskError};
