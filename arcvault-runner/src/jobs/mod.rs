//! Concrete batch jobs
//!
//! Job implementations are pluggable collaborators of the runner; this
//! module carries the crawl-log reporting job shipped with arcvault.

pub mod crawl_log;

pub use crawl_log::CrawlLogLinesMatching;
