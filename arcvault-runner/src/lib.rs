//! Arcvault Runner
//!
//! The local batch execution engine: drives a `BatchJob` sequentially over
//! a list of fetched container files, funnels all job output into one
//! result sink, isolates per-file failures, and reports a `BatchOutcome`.

pub mod job;
pub mod jobs;
pub mod runner;

// Re-export the execution surface
pub use job::{BatchJob, RecordFilter};
pub use runner::BatchRunner;
