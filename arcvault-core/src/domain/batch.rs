//! Batch accounting types
//!
//! A batch run produces a `BatchOutcome` (owned and mutated by the runner
//! only), which the client folds into the `BatchStatus` returned to the
//! caller together with the result working file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{RepositoryError, Result};

/// A single per-file failure captured during a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// The container file the failure occurred in
    pub file: PathBuf,
    /// The rendered error chain
    pub error: String,
}

/// Counters and metadata for one batch run
///
/// Invariant: `processed_files + failed_files` equals the number of files
/// attempted, and `failures.len() == failed_files`. Files abandoned after
/// the wall-clock budget expired were never attempted.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Identifier of this run, tagged on all its log events
    pub run_id: Uuid,
    /// Files scanned to completion
    pub processed_files: usize,
    /// Files that raised an error during scanning or processing
    pub failed_files: usize,
    /// One entry per failed file, in failure order
    pub failures: Vec<FileFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Whether the run abandoned remaining files on budget expiry
    pub timed_out: bool,
}

/// Aggregated result of one `batch()` call
///
/// Immutable after construction. Owns the temporary result file; the file
/// is removed from disk when the status is dropped.
#[derive(Debug)]
pub struct BatchStatus {
    target: String,
    run_id: Option<Uuid>,
    processed_files: usize,
    failed_files: usize,
    failures: Vec<FileFailure>,
    timed_out: bool,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result_file: Option<NamedTempFile>,
}

impl BatchStatus {
    /// Builds the status for a completed run
    pub fn new(target: impl Into<String>, outcome: BatchOutcome, result_file: NamedTempFile) -> Self {
        Self {
            target: target.into(),
            run_id: Some(outcome.run_id),
            processed_files: outcome.processed_files,
            failed_files: outcome.failed_files,
            failures: outcome.failures,
            timed_out: outcome.timed_out,
            started_at: Some(outcome.started_at),
            completed_at: Some(outcome.completed_at),
            result_file: Some(result_file),
        }
    }

    /// Builds the status of a batch call that never ran
    ///
    /// Used when the job's filename pattern is ineligible for batch
    /// execution: zero counters and no result file.
    pub fn empty(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            run_id: None,
            processed_files: 0,
            failed_files: 0,
            failures: Vec::new(),
            timed_out: false,
            started_at: None,
            completed_at: None,
            result_file: None,
        }
    }

    /// The target the batch call was addressed to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run identifier, absent when the batch never ran
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn processed_files(&self) -> usize {
        self.processed_files
    }

    pub fn failed_files(&self) -> usize {
        self.failed_files
    }

    /// Per-file failures, in failure order
    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Path of the result file, absent when the batch never ran
    pub fn result_path(&self) -> Option<&Path> {
        self.result_file.as_ref().map(|f| f.path())
    }

    /// Copies the batch result into `destination`
    ///
    /// # Errors
    /// `Storage` when this status holds no result file or the copy fails.
    pub fn copy_results(&self, destination: &Path) -> Result<u64> {
        let path = self.require_result()?;
        std::fs::copy(path, destination).map_err(|e| {
            RepositoryError::storage_with(
                format!("cannot copy batch results to {}", destination.display()),
                e,
            )
        })
    }

    /// Streams the batch result into `sink`
    ///
    /// # Errors
    /// `Storage` when this status holds no result file or the transfer
    /// fails.
    pub fn append_results(&self, sink: &mut dyn Write) -> Result<u64> {
        let path = self.require_result()?;
        let mut file = File::open(path).map_err(|e| {
            RepositoryError::storage_with(
                format!("cannot open batch result file {}", path.display()),
                e,
            )
        })?;
        io::copy(&mut file, sink)
            .map_err(|e| RepositoryError::storage_with("cannot append batch results", e))
    }

    fn require_result(&self) -> Result<&Path> {
        self.result_path()
            .ok_or_else(|| RepositoryError::storage("batch produced no result file"))
    }
}
