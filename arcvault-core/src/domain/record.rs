//! Container record model

use serde::{Deserialize, Serialize};

/// Header of one record inside a container file
///
/// Shared between the client (record extraction) and batch jobs (record
/// filtering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Origin URL the payload was captured from
    pub origin_url: String,
    /// Archival timestamp token, kept verbatim from the container file
    pub timestamp: String,
    /// Payload size in bytes
    pub payload_length: u64,
    /// Absolute byte offset of the record's header line in the file
    pub offset: u64,
}

/// A fully materialized record: header plus payload bytes
///
/// Returned by `RepositoryClient::get`. Records scanned during a batch run
/// stay lazy instead; see the `container` module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub header: RecordHeader,
    pub payload: Vec<u8>,
}
