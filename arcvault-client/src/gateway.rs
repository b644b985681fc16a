//! Repository gateway contract
//!
//! The replicated storage fabric itself (integrity verification across
//! redundant copies, checksum reconciliation, credential handling) lives
//! behind this trait. The client treats it as an opaque transfer service.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use arcvault_core::error::Result;

/// Transfer operations against the replicated repository
///
/// All object names are unique within a collection. Existence is
/// authoritative at call time; the client never caches it beyond a single
/// call.
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Returns whether an object named `name` exists in `collection`
    async fn exists_in_collection(&self, name: &str, collection: &str) -> Result<bool>;

    /// Uploads `file` under `name` into `collection`
    ///
    /// Returns whether the upload succeeded.
    async fn upload_file(&self, file: &Path, name: &str, collection: &str) -> Result<bool>;

    /// Downloads `name` from `collection` into a gateway-managed local
    /// file and returns its path
    ///
    /// `checksum_hint` requests verification against a known checksum;
    /// this client always passes `None`.
    async fn get_file(
        &self,
        name: &str,
        collection: &str,
        checksum_hint: Option<&str>,
    ) -> Result<PathBuf>;

    /// Releases the gateway connection
    async fn shutdown(&self) -> Result<()>;
}
