//! Arcvault Client
//!
//! Client-side access layer to a replicated, checksum-verified archive
//! repository. `RepositoryClient` exposes store/get/get_file/batch over
//! one logical collection; batch jobs are executed locally after the
//! container files are fetched through the repository gateway.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use arcvault_client::{ClientConfig, RepositoryClient, RepositoryGateway};
//! use arcvault_runner::jobs::CrawlLogLinesMatching;
//!
//! async fn example(gateway: Arc<dyn RepositoryGateway>) -> anyhow::Result<()> {
//!     let config = ClientConfig::new("netarchive", "/var/tmp/arcvault");
//!     let client = RepositoryClient::new(config, gateway).await?;
//!
//!     let mut job = CrawlLogLinesMatching::new("^http://example\\.org/.*")?
//!         .process_only_files_matching("7-metadata-[0-9]+.(w)?arc");
//!     let status = client.batch(&mut job, "replica-one", &[]).await?;
//!
//!     println!("{} file(s) processed", status.processed_files());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod gateway;
pub mod resolver;

// Re-export commonly used types
pub use arcvault_core::error::{RepositoryError, Result};
pub use client::RepositoryClient;
pub use config::ClientConfig;
pub use gateway::RepositoryGateway;
