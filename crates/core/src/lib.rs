//! Domain fundamentals for the records-presentation extension.
//!
//! This crate has zero internal dependencies. It holds the error taxonomy,
//! the per-job scratch space, identity/permission primitives, the record
//! store collaborator interface, and filename sanitization. Everything
//! HTTP- or runtime-shaped lives in the `presenta-engine` and
//! `presenta-api` crates.

pub mod error;
pub mod identity;
pub mod permissions;
pub mod record;
pub mod sanitize;
pub mod scratch;

pub use error::CoreError;
