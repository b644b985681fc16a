//! Repository client facade
//!
//! `RepositoryClient` exposes store/get/get_file/batch over one logical
//! collection. Batch jobs are executed locally after the container files
//! are fetched from the repository. The administrative repository
//! operations are a declared narrowing of the broader client surface:
//! every one of them fails deterministically with `NotSupported`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use arcvault_core::container::ContainerReader;
use arcvault_core::domain::batch::BatchStatus;
use arcvault_core::domain::record::ArchiveRecord;
use arcvault_core::error::{RepositoryError, Result};
use arcvault_runner::{BatchJob, BatchRunner};

use crate::config::ClientConfig;
use crate::gateway::RepositoryGateway;
use crate::resolver;

/// Facade over one repository collection
///
/// Holds no cross-call mutable state besides the gateway handle and the
/// working directory, so calls for distinct object names may run
/// concurrently from multiple callers. The existence-check-then-upload
/// sequence in `store` is not atomic: two concurrent stores of the same
/// name can both pass the existence check before either uploads. That
/// hazard is inherited from the gateway contract and not fixed here.
pub struct RepositoryClient {
    config: ClientConfig,
    gateway: Arc<dyn RepositoryGateway>,
}

impl RepositoryClient {
    /// Creates a client for the configured collection
    ///
    /// Creates the working directory when it does not exist yet.
    pub async fn new(config: ClientConfig, gateway: Arc<dyn RepositoryGateway>) -> Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.working_dir)
            .await
            .map_err(|e| {
                RepositoryError::storage_with(
                    format!(
                        "cannot create working directory {}",
                        config.working_dir.display()
                    ),
                    e,
                )
            })?;
        info!("Storing working files in {}", config.working_dir.display());
        Ok(Self { config, gateway })
    }

    /// The collection this client operates against
    pub fn collection_id(&self) -> &str {
        &self.config.collection_id
    }

    /// The directory working files are materialized in
    pub fn working_dir(&self) -> &Path {
        &self.config.working_dir
    }

    /// Stores `file` in the collection under its file name
    ///
    /// Idempotent at the name level: when an object with the same name
    /// already exists, the call succeeds without uploading anything. The
    /// source file is left in place; the caller owns its cleanup.
    ///
    /// # Errors
    /// `InvalidArgument` when `file` is not an existing regular file,
    /// checked before any gateway contact; `Storage` when the upload
    /// fails.
    pub async fn store(&self, file: &Path) -> Result<()> {
        if !file.is_file() {
            return Err(RepositoryError::invalid_argument(format!(
                "file '{}' does not exist or is not a regular file",
                file.display()
            )));
        }
        let name = object_name(file)?;

        if self
            .gateway
            .exists_in_collection(&name, &self.config.collection_id)
            .await?
        {
            warn!(
                "The file '{}' is already in collection '{}'",
                name, self.config.collection_id
            );
            return Ok(());
        }

        if !self
            .gateway
            .upload_file(file, &name, &self.config.collection_id)
            .await?
        {
            return Err(RepositoryError::storage(format!(
                "upload of '{}' to collection '{}' failed",
                name, self.config.collection_id
            )));
        }
        info!(
            "Upload of '{}' to collection '{}' was successful",
            name, self.config.collection_id
        );
        Ok(())
    }

    /// Gets a single record out of the repository
    ///
    /// `index` is the byte offset of the record inside the object named
    /// `name`. An absent object is a legitimate outcome, returned as
    /// `Ok(None)` rather than an error.
    ///
    /// # Errors
    /// `InvalidArgument` on an empty name or a negative index, checked
    /// before any gateway contact; `Storage` when the fetch or the record
    /// extraction fails.
    pub async fn get(&self, name: &str, index: i64) -> Result<Option<ArchiveRecord>> {
        if name.is_empty() {
            return Err(RepositoryError::invalid_argument("name cannot be empty"));
        }
        if index < 0 {
            return Err(RepositoryError::invalid_argument(format!(
                "index cannot be negative, got {index}"
            )));
        }

        if !self
            .gateway
            .exists_in_collection(name, &self.config.collection_id)
            .await?
        {
            warn!(
                "The file '{}' is not in collection '{}'; returning no record",
                name, self.config.collection_id
            );
            return Ok(None);
        }

        let fetched = self
            .gateway
            .get_file(name, &self.config.collection_id, None)
            .await?;
        let record = extract_record(&fetched, index as u64, name);
        remove_working_file(&fetched).await;
        record.map(Some)
    }

    /// Retrieves an object and places it in `destination`
    ///
    /// Unlike `get`, an absent object is a hard failure here: the caller
    /// expects a materialized file.
    ///
    /// # Errors
    /// `InvalidArgument` on an empty name or destination, checked before
    /// any gateway contact; `Storage` when the object is absent or the
    /// transfer fails.
    pub async fn get_file(&self, name: &str, destination: &Path) -> Result<()> {
        if name.is_empty() {
            return Err(RepositoryError::invalid_argument("name cannot be empty"));
        }
        if destination.as_os_str().is_empty() {
            return Err(RepositoryError::invalid_argument(
                "destination cannot be empty",
            ));
        }

        if !self
            .gateway
            .exists_in_collection(name, &self.config.collection_id)
            .await?
        {
            warn!(
                "The file '{}' is not in collection '{}'",
                name, self.config.collection_id
            );
            return Err(RepositoryError::storage(format!(
                "file '{name}' does not exist in collection '{}'",
                self.config.collection_id
            )));
        }

        let fetched = self
            .gateway
            .get_file(name, &self.config.collection_id, None)
            .await?;
        let copied = tokio::fs::copy(&fetched, destination).await.map_err(|e| {
            RepositoryError::storage_with(
                format!("cannot copy '{name}' to {}", destination.display()),
                e,
            )
        });
        remove_working_file(&fetched).await;
        let copied = copied?;
        debug!(
            "Copied {} byte(s) of '{}' to {}",
            copied,
            name,
            destination.display()
        );
        Ok(())
    }

    /// Runs a batch job against the job's metadata container file
    ///
    /// The file to run on is deduced from the job's filename pattern. A
    /// pattern that does not name metadata files makes the job ineligible:
    /// the call returns an empty status without contacting the gateway. A
    /// resolved file missing from the collection is skipped with a
    /// warning, and the run covers whatever was fetched, possibly nothing.
    /// `args` are accepted for interface compatibility and ignored.
    ///
    /// # Errors
    /// `Storage` when materializing an input or the result file fails, or
    /// when the job fails at the run level (initialize/finish). Per-file
    /// processing failures never fail the call; they are counted on the
    /// returned status.
    pub async fn batch(
        &self,
        job: &mut dyn BatchJob,
        target: &str,
        args: &[String],
    ) -> Result<BatchStatus> {
        let pattern = job.filename_pattern().to_string();
        info!("Deducing the file to run batch on from pattern '{pattern}'");
        if !args.is_empty() {
            debug!("Ignoring {} batch argument(s)", args.len());
        }

        let Some(name) = resolver::resolve_metadata_name(&pattern) else {
            warn!(
                "Pattern '{pattern}' does not name metadata files; returning an empty batch status"
            );
            return Ok(BatchStatus::empty(target));
        };

        let mut files: Vec<PathBuf> = Vec::new();
        if self
            .gateway
            .exists_in_collection(&name, &self.config.collection_id)
            .await?
        {
            let fetched = self
                .gateway
                .get_file(&name, &self.config.collection_id, None)
                .await?;
            let work_file = self.config.working_dir.join(&name);
            move_into_place(&fetched, &work_file).await?;
            files.push(work_file);
        } else {
            warn!(
                "The file '{}' is not in collection '{}'; skipping it",
                name, self.config.collection_id
            );
        }

        let mut result_file = tempfile::Builder::new()
            .prefix("batch-")
            .suffix(target)
            .tempfile_in(&self.config.working_dir)
            .map_err(|e| RepositoryError::storage_with("cannot create batch result file", e))?;

        let run_result = BatchRunner::new().run(job, &files, result_file.as_file_mut());
        for file in &files {
            remove_working_file(file).await;
        }
        let outcome = run_result.map_err(|e| {
            RepositoryError::storage_with(format!("cannot perform batch for pattern '{pattern}'"), e)
        })?;

        // Close failures are logged, never raised over a finished run.
        if let Err(e) = result_file.as_file().sync_all() {
            warn!(
                "Error flushing batch result file {}: {}",
                result_file.path().display(),
                e
            );
        }

        info!(
            "Batch for pattern '{}' done: {} file(s) processed, {} failed",
            pattern,
            outcome.processed_files,
            outcome.failed_files
        );
        Ok(BatchStatus::new(target, outcome, result_file))
    }

    /// Shuts down the gateway connection
    pub async fn close(self) -> Result<()> {
        self.gateway.shutdown().await
    }

    // =========================================================================
    // Administrative operations: intentionally unsupported in this client
    // variant. Each call fails deterministically without gateway contact.
    // =========================================================================

    /// Updating administrative data is not supported by this client
    pub fn update_admin_data(
        &self,
        _file_name: &str,
        _replica_id: &str,
        _new_state: &str,
    ) -> Result<()> {
        Err(RepositoryError::NotSupported("update_admin_data"))
    }

    /// Updating an administrative checksum is not supported by this client
    pub fn update_admin_checksum(&self, _file_name: &str, _checksum: &str) -> Result<()> {
        Err(RepositoryError::NotSupported("update_admin_checksum"))
    }

    /// Removing a file for repair is not supported by this client
    pub fn remove_and_get_file(
        &self,
        _file_name: &str,
        _replica_id: &str,
        _checksum: &str,
        _credentials: &str,
    ) -> Result<PathBuf> {
        Err(RepositoryError::NotSupported("remove_and_get_file"))
    }

    /// Retrieving all checksums is not supported by this client
    pub fn get_all_checksums(&self, _replica_id: &str) -> Result<PathBuf> {
        Err(RepositoryError::NotSupported("get_all_checksums"))
    }

    /// Retrieving all filenames is not supported by this client
    pub fn get_all_filenames(&self, _replica_id: &str) -> Result<PathBuf> {
        Err(RepositoryError::NotSupported("get_all_filenames"))
    }

    /// Correcting a bad entry is not supported by this client
    pub fn correct(
        &self,
        _replica_id: &str,
        _checksum: &str,
        _file: &Path,
        _credentials: &str,
    ) -> Result<PathBuf> {
        Err(RepositoryError::NotSupported("correct"))
    }

    /// Retrieving a single checksum is not supported by this client
    pub fn get_checksum(&self, _replica_id: &str, _file_name: &str) -> Result<String> {
        Err(RepositoryError::NotSupported("get_checksum"))
    }
}

/// Derives the object name from the file name of `file`
fn object_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            RepositoryError::invalid_argument(format!(
                "file '{}' has no usable name",
                file.display()
            ))
        })
}

/// Extracts the record at `offset` from a fetched container file
fn extract_record(path: &Path, offset: u64, name: &str) -> Result<ArchiveRecord> {
    let mut reader = ContainerReader::open(path).map_err(|e| {
        RepositoryError::storage_with(format!("cannot open fetched copy of '{name}'"), e)
    })?;
    reader.record_at(offset).map_err(|e| {
        RepositoryError::storage_with(
            format!("cannot read record at offset {offset} of '{name}'"),
            e,
        )
    })
}

/// Moves a gateway-delivered file into the working directory
///
/// Falls back to copy-and-remove when the rename crosses filesystems.
async fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await.map_err(|e| {
        RepositoryError::storage_with(
            format!("cannot move fetched file into place at {}", to.display()),
            e,
        )
    })?;
    remove_working_file(from).await;
    Ok(())
}

/// Removes a working file, logging instead of failing on error
async fn remove_working_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Cannot remove working file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use arcvault_core::container::write_record;
    use arcvault_runner::jobs::CrawlLogLinesMatching;
    use arcvault_runner::jobs::crawl_log::CRAWL_LOG_URL_PREFIX;

    /// In-memory gateway delivering objects through a scratch directory
    struct FakeGateway {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        delivery_dir: TempDir,
        exists_calls: AtomicUsize,
        uploads: AtomicUsize,
        fetches: AtomicUsize,
        fail_uploads: bool,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                delivery_dir: TempDir::new().unwrap(),
                exists_calls: AtomicUsize::new(0),
                uploads: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
                fail_uploads: false,
            }
        }

        fn with_object(self, name: &str, bytes: Vec<u8>) -> Self {
            self.objects.lock().unwrap().insert(name.to_string(), bytes);
            self
        }

        fn gateway_calls(&self) -> usize {
            self.exists_calls.load(Ordering::SeqCst)
                + self.uploads.load(Ordering::SeqCst)
                + self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositoryGateway for FakeGateway {
        async fn exists_in_collection(&self, name: &str, _collection: &str) -> Result<bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.objects.lock().unwrap().contains_key(name))
        }

        async fn upload_file(&self, file: &Path, name: &str, _collection: &str) -> Result<bool> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail_uploads {
                return Ok(false);
            }
            let bytes = std::fs::read(file)
                .map_err(|e| RepositoryError::storage_with("cannot read upload source", e))?;
            self.objects.lock().unwrap().insert(name.to_string(), bytes);
            Ok(true)
        }

        async fn get_file(
            &self,
            name: &str,
            _collection: &str,
            _checksum_hint: Option<&str>,
        ) -> Result<PathBuf> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let bytes = self
                .objects
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| RepositoryError::storage(format!("'{name}' is gone")))?;
            let delivery = self.delivery_dir.path().join(format!("delivery-{name}"));
            std::fs::write(&delivery, bytes)
                .map_err(|e| RepositoryError::storage_with("cannot deliver file", e))?;
            Ok(delivery)
        }

        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    fn crawl_log_container() -> Vec<u8> {
        let mut bytes = Vec::new();
        write_record(
            &mut bytes,
            CRAWL_LOG_URL_PREFIX,
            "20260101120000",
            b"a1\nb2\na3\n",
        )
        .unwrap();
        bytes
    }

    async fn client_with(gateway: FakeGateway) -> (RepositoryClient, Arc<FakeGateway>, TempDir) {
        let gateway = Arc::new(gateway);
        let workdir = TempDir::new().unwrap();
        let config = ClientConfig::new("test-collection", workdir.path());
        let client = RepositoryClient::new(config, gateway.clone()).await.unwrap();
        (client, gateway, workdir)
    }

    fn source_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_store_uploads_new_object() {
        let (client, gateway, workdir) = client_with(FakeGateway::new()).await;
        let file = source_file(&workdir, "3-metadata-1.arc", b"bytes");

        client.store(&file).await.unwrap();

        assert_eq!(gateway.uploads.load(Ordering::SeqCst), 1);
        // The source file is left in place; the caller owns its cleanup.
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_store_twice_uploads_once() {
        let (client, gateway, workdir) = client_with(FakeGateway::new()).await;
        let file = source_file(&workdir, "3-metadata-1.arc", b"bytes");

        client.store(&file).await.unwrap();
        client.store(&file).await.unwrap();

        assert_eq!(gateway.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_missing_file_fails_without_gateway_contact() {
        let (client, gateway, workdir) = client_with(FakeGateway::new()).await;
        let missing = workdir.path().join("not-there.arc");

        let err = client.store(&missing).await.unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_directory_fails_without_gateway_contact() {
        let (client, gateway, workdir) = client_with(FakeGateway::new()).await;

        let err = client.store(workdir.path()).await.unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failed_upload_is_a_storage_failure() {
        let mut gateway = FakeGateway::new();
        gateway.fail_uploads = true;
        let (client, _gateway, workdir) = client_with(gateway).await;
        let file = source_file(&workdir, "3-metadata-1.arc", b"bytes");

        let err = client.store(&file).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_get_negative_index_fails_without_gateway_contact() {
        let (client, gateway, _workdir) = client_with(FakeGateway::new()).await;

        let err = client.get("3-metadata-1.arc", -1).await.unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_empty_name_fails_without_gateway_contact() {
        let (client, gateway, _workdir) = client_with(FakeGateway::new()).await;

        let err = client.get("", 0).await.unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_absent_object_is_none_not_an_error() {
        let (client, _gateway, _workdir) = client_with(FakeGateway::new()).await;

        let record = client.get("3-metadata-1.arc", 0).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_record_at_offset() {
        let gateway =
            FakeGateway::new().with_object("3-metadata-1.arc", crawl_log_container());
        let (client, _gateway, _workdir) = client_with(gateway).await;

        let record = client.get("3-metadata-1.arc", 0).await.unwrap().unwrap();

        assert_eq!(record.header.origin_url, CRAWL_LOG_URL_PREFIX);
        assert_eq!(record.payload, b"a1\nb2\na3\n");
    }

    #[tokio::test]
    async fn test_get_file_absent_object_is_a_storage_failure() {
        let (client, _gateway, workdir) = client_with(FakeGateway::new()).await;
        let dest = workdir.path().join("out.arc");

        let err = client.get_file("3-metadata-1.arc", &dest).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_get_file_copies_object_to_destination() {
        let gateway = FakeGateway::new().with_object("3-metadata-1.arc", b"content".to_vec());
        let (client, _gateway, workdir) = client_with(gateway).await;
        let dest = workdir.path().join("out.arc");

        client.get_file("3-metadata-1.arc", &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_get_file_empty_destination_fails_without_gateway_contact() {
        let (client, gateway, _workdir) = client_with(FakeGateway::new()).await;

        let err = client
            .get_file("3-metadata-1.arc", Path::new(""))
            .await
            .unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_ineligible_pattern_is_an_empty_status() {
        let (client, gateway, _workdir) = client_with(FakeGateway::new()).await;
        let mut job = CrawlLogLinesMatching::new("^a.*")
            .unwrap()
            .process_only_files_matching("7-content-[0-9]+.arc");

        let status = client.batch(&mut job, "replica-one", &[]).await.unwrap();

        assert_eq!(status.processed_files(), 0);
        assert_eq!(status.failed_files(), 0);
        assert!(status.result_path().is_none());
        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_processes_the_first_metadata_file() {
        let gateway =
            FakeGateway::new().with_object("7-metadata-1.arc", crawl_log_container());
        let (client, _gateway, _workdir) = client_with(gateway).await;
        let mut job = CrawlLogLinesMatching::new("^a.*")
            .unwrap()
            .process_only_files_matching("7-metadata-[0-9]+.(w)?arc");

        let status = client.batch(&mut job, "replica-one", &[]).await.unwrap();

        assert_eq!(status.processed_files(), 1);
        assert_eq!(status.failed_files(), 0);
        assert_eq!(status.target(), "replica-one");

        let mut results = Vec::new();
        status.append_results(&mut results).unwrap();
        assert_eq!(results, b"a1\na3\n");
    }

    #[tokio::test]
    async fn test_batch_missing_object_is_skipped_not_fatal() {
        let (client, _gateway, _workdir) = client_with(FakeGateway::new()).await;
        let mut job = CrawlLogLinesMatching::new("^a.*")
            .unwrap()
            .process_only_files_matching("7-metadata-[0-9]+.(w)?arc");

        let status = client.batch(&mut job, "replica-one", &[]).await.unwrap();

        assert_eq!(status.processed_files(), 0);
        assert_eq!(status.failed_files(), 0);
        // The run still happened: an (empty) result file exists.
        assert!(status.result_path().is_some());
    }

    #[tokio::test]
    async fn test_batch_cleans_fetched_files_from_working_dir() {
        let gateway =
            FakeGateway::new().with_object("7-metadata-1.arc", crawl_log_container());
        let (client, _gateway, workdir) = client_with(gateway).await;
        let mut job = CrawlLogLinesMatching::new("^a.*")
            .unwrap()
            .process_only_files_matching("7-metadata-[0-9]+.(w)?arc");

        client.batch(&mut job, "replica-one", &[]).await.unwrap();

        assert!(!workdir.path().join("7-metadata-1.arc").exists());
    }

    #[tokio::test]
    async fn test_admin_operations_are_not_supported_without_gateway_contact() {
        let (client, gateway, _workdir) = client_with(FakeGateway::new()).await;

        assert!(client
            .update_admin_data("f", "r", "uploaded")
            .unwrap_err()
            .is_not_supported());
        assert!(client
            .update_admin_checksum("f", "c")
            .unwrap_err()
            .is_not_supported());
        assert!(client
            .remove_and_get_file("f", "r", "c", "pw")
            .unwrap_err()
            .is_not_supported());
        assert!(client.get_all_checksums("r").unwrap_err().is_not_supported());
        assert!(client.get_all_filenames("r").unwrap_err().is_not_supported());
        assert!(client
            .correct("r", "c", Path::new("f"), "pw")
            .unwrap_err()
            .is_not_supported());
        assert!(client.get_checksum("r", "f").unwrap_err().is_not_supported());

        assert_eq!(gateway.gateway_calls(), 0);
    }

    #[tokio::test]
    async fn test_close_shuts_down_the_gateway() {
        let (client, _gateway, _workdir) = client_with(FakeGateway::new()).await;
        client.close().await.unwrap();
    }
}
