//! Data transfer objects for batch results
//!
//! Lightweight, serializable views of batch outcomes for callers that log
//! or forward results. The result file itself stays owned by the
//! `BatchStatus`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::batch::{BatchStatus, FileFailure};

/// Serializable summary of a finished batch call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub target: String,
    pub processed_files: usize,
    pub failed_files: usize,
    pub timed_out: bool,
    /// Per-file failures, in failure order
    pub failures: Vec<FileFailure>,
    /// Path of the result file while the originating status is alive
    pub result_file: Option<PathBuf>,
}

impl From<&BatchStatus> for BatchReport {
    fn from(status: &BatchStatus) -> Self {
        Self {
            target: status.target().to_string(),
            processed_files: status.processed_files(),
            failed_files: status.failed_files(),
            timed_out: status.timed_out(),
            failures: status.failures().to_vec(),
            result_file: status.result_path().map(PathBuf::from),
        }
    }
}
