//! Crawl-log line extraction
//!
//! A batch job that extracts, from the crawl-log records of metadata
//! container files, the log lines matching a regular expression. Restrict
//! the job to one harvest job's metadata files with
//! `process_only_files_matching`.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;

use arcvault_core::container::Record;

use crate::job::{BatchJob, RecordFilter};

/// Origin-URL prefix identifying crawl-log records inside metadata
/// container files
pub const CRAWL_LOG_URL_PREFIX: &str = "metadata://archive/crawl/logs/crawl.log";

// Seven days.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Batch job emitting crawl-log lines that match a regular expression
///
/// Matching uses whole-line semantics: the expression must match the
/// entire line, not a substring. Matched lines are written to the sink in
/// input order, each followed by a newline.
pub struct CrawlLogLinesMatching {
    pattern: Regex,
    /// The caller-supplied expression, kept for display
    source: String,
    filename_pattern: String,
    timeout: Duration,
}

impl CrawlLogLinesMatching {
    /// Creates the job from the regular expression to match
    ///
    /// # Errors
    /// Fails when `regexp` is empty or not a valid regular expression.
    pub fn new(regexp: &str) -> Result<Self> {
        if regexp.is_empty() {
            anyhow::bail!("regexp cannot be empty");
        }
        // Anchor both ends so a line only matches as a whole.
        let pattern = Regex::new(&format!(r"\A(?:{regexp})\z"))
            .with_context(|| format!("invalid line expression '{regexp}'"))?;
        Ok(Self {
            pattern,
            source: regexp.to_string(),
            filename_pattern: ".*".to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Restricts the job to container files matching `pattern`
    pub fn process_only_files_matching(mut self, pattern: impl Into<String>) -> Self {
        self.filename_pattern = pattern.into();
        self
    }
}

impl BatchJob for CrawlLogLinesMatching {
    fn filter(&self) -> RecordFilter {
        RecordFilter::new("OnlyCrawlLog", |header| {
            header.origin_url.starts_with(CRAWL_LOG_URL_PREFIX)
        })
    }

    fn process(&mut self, record: &mut Record<'_>, sink: &mut dyn Write) -> Result<()> {
        let reader = BufReader::new(record);
        for line in reader.lines() {
            let line = line.context("cannot read crawl-log line")?;
            if self.pattern.is_match(&line) {
                sink.write_all(line.as_bytes())?;
                sink.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn filename_pattern(&self) -> &str {
        &self.filename_pattern
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Display for CrawlLogLinesMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CrawlLogLinesMatching(regexp = {}, filter = {})",
            self.source,
            self.filter()
        )
    }
}
