//! Batch runner
//!
//! Executes a batch job over locally fetched container files: strictly
//! sequential, in list order, with no concurrency within one run, so
//! output ordering stays deterministic. A failure
//! while scanning or processing one file is captured on the outcome and
//! never aborts the remaining files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use arcvault_core::container::ContainerReader;
use arcvault_core::domain::batch::{BatchOutcome, FileFailure};

use crate::job::{BatchJob, RecordFilter};

/// Sequential executor for batch jobs
pub struct BatchRunner;

impl BatchRunner {
    /// Creates a new batch runner
    pub fn new() -> Self {
        Self
    }

    /// Runs `job` over `files` in list order, writing into `sink`
    ///
    /// Lifecycle: `initialize` once, each file scanned record by record
    /// with accepted records handed to `process`, `finish` once, also on
    /// an empty file list and after a timeout. The job's wall-clock budget
    /// is checked at file boundaries; on expiry the remaining files are
    /// abandoned and counted as neither processed nor failed.
    ///
    /// # Errors
    /// Only a failure in `initialize` or `finish` aborts the run.
    /// Per-file failures are captured on the returned outcome.
    pub fn run(
        &self,
        job: &mut dyn BatchJob,
        files: &[PathBuf],
        sink: &mut dyn Write,
    ) -> Result<BatchOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let budget = job.timeout();

        info!(
            "Starting batch run {} over {} file(s) with budget {:?}",
            run_id,
            files.len(),
            budget
        );

        job.initialize(sink).context("job initialisation failed")?;
        let filter = job.filter();
        debug!("Batch run {} uses record filter '{}'", run_id, filter);

        let mut processed_files = 0;
        let mut failures: Vec<FileFailure> = Vec::new();
        let mut timed_out = false;

        for file in files {
            if clock.elapsed() >= budget {
                timed_out = true;
                let abandoned = files.len() - processed_files - failures.len();
                warn!(
                    "Batch run {} exceeded its {:?} budget; abandoning {} remaining file(s)",
                    run_id, budget, abandoned
                );
                break;
            }

            debug!("Batch run {} scanning {}", run_id, file.display());
            match Self::run_file(job, &filter, file, sink) {
                Ok(accepted) => {
                    debug!(
                        "Batch run {} processed {} record(s) from {}",
                        run_id,
                        accepted,
                        file.display()
                    );
                    processed_files += 1;
                }
                Err(e) => {
                    warn!("Batch run {} failed on {}: {:#}", run_id, file.display(), e);
                    failures.push(FileFailure {
                        file: file.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        job.finish(sink).context("job completion failed")?;

        let outcome = BatchOutcome {
            run_id,
            processed_files,
            failed_files: failures.len(),
            failures,
            started_at,
            completed_at: Utc::now(),
            timed_out,
        };
        info!(
            "Batch run {} finished: {} processed, {} failed{}",
            run_id,
            outcome.processed_files,
            outcome.failed_files,
            if outcome.timed_out { ", timed out" } else { "" }
        );
        Ok(outcome)
    }

    /// Scans one container file, handing accepted records to the job
    ///
    /// Returns the number of records the job processed.
    fn run_file(
        job: &mut dyn BatchJob,
        filter: &RecordFilter,
        file: &Path,
        sink: &mut dyn Write,
    ) -> Result<usize> {
        let mut reader = ContainerReader::open(file)
            .with_context(|| format!("cannot open container file {}", file.display()))?;

        let mut accepted = 0;
        loop {
            let record = reader
                .next_record()
                .with_context(|| format!("cannot scan {}", file.display()))?;
            let Some(mut record) = record else {
                break;
            };
            if filter.accept(record.header()) {
                let offset = record.header().offset;
                job.process(&mut record, sink)
                    .with_context(|| format!("processing record at offset {offset} failed"))?;
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}
