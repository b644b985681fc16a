//! Batch job contract
//!
//! A batch job is a pluggable unit of work with a fixed lifecycle:
//! `initialize` once, then `process` for every record its filter accepts,
//! then `finish` once. Jobs declare the filename pattern naming the
//! container files they run on and a wall-clock budget for one run.
//! Progress counters live on the runner's `BatchOutcome`, not on the job.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;

use arcvault_core::container::Record;
use arcvault_core::domain::record::RecordHeader;

/// Named predicate selecting which records a job processes
///
/// Evaluated against the record header only; a record that is accepted has
/// its payload stream handed to `BatchJob::process`. The predicate is
/// infallible, so filtering never contributes to a file's failure.
pub struct RecordFilter {
    name: &'static str,
    predicate: Box<dyn Fn(&RecordHeader) -> bool + Send>,
}

impl RecordFilter {
    /// Creates a named filter from a header predicate
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&RecordHeader) -> bool + Send + 'static,
    ) -> Self {
        Self {
            name,
            predicate: Box::new(predicate),
        }
    }

    /// Filter accepting every record
    pub fn accept_all() -> Self {
        Self::new("All", |_| true)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn accept(&self, header: &RecordHeader) -> bool {
        (self.predicate)(header)
    }
}

impl fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordFilter").field(&self.name).finish()
    }
}

impl fmt::Display for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A pluggable unit of batch work
///
/// Implementations are driven by `BatchRunner`. The sink passed to every
/// lifecycle method is the shared result stream for the whole run; records
/// arrive in input order, one file at a time.
pub trait BatchJob: Send {
    /// Called exactly once before any file is processed
    fn initialize(&mut self, _sink: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    /// Returns the record filter for this job
    fn filter(&self) -> RecordFilter {
        RecordFilter::accept_all()
    }

    /// Called for every record accepted by the filter
    ///
    /// An error fails the file currently being scanned, not the run.
    fn process(&mut self, record: &mut Record<'_>, sink: &mut dyn Write) -> Result<()>;

    /// Called exactly once after all files have been attempted
    ///
    /// Invoked even when the file list was empty, every file failed, or
    /// the run timed out.
    fn finish(&mut self, _sink: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    /// Pattern naming the container files this job runs on
    fn filename_pattern(&self) -> &str;

    /// Wall-clock budget for one run; work past it is abandoned
    fn timeout(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(url: &str) -> RecordHeader {
        RecordHeader {
            origin_url: url.to_string(),
            timestamp: "20260101120000".to_string(),
            payload_length: 0,
            offset: 0,
        }
    }

    #[test]
    fn test_filter_accepts_by_predicate() {
        let filter = RecordFilter::new("OnlyExample", |h| h.origin_url.contains("example"));
        assert!(filter.accept(&header("http://example.org/")));
        assert!(!filter.accept(&header("http://other.org/")));
        assert_eq!(filter.name(), "OnlyExample");
    }

    #[test]
    fn test_accept_all_accepts_everything() {
        let filter = RecordFilter::accept_all();
        assert!(filter.accept(&header("metadata://whatever")));
        assert_eq!(filter.to_string(), "All");
    }
}
