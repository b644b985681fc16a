//! Client configuration
//!
//! Explicit configuration passed at construction time; nothing is read
//! from process-wide state.

use std::path::PathBuf;

use arcvault_core::error::{RepositoryError, Result};

/// Configuration for a `RepositoryClient`
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Collection the client operates against; object names are unique
    /// within it
    pub collection_id: String,

    /// Directory fetched objects and batch result files are materialized
    /// in
    pub working_dir: PathBuf,
}

impl ClientConfig {
    /// Creates a new configuration
    pub fn new(collection_id: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            collection_id: collection_id.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    /// `InvalidArgument` when the collection id or working directory is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.collection_id.is_empty() {
            return Err(RepositoryError::invalid_argument(
                "collection_id cannot be empty",
            ));
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(RepositoryError::invalid_argument(
                "working_dir cannot be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        let config = ClientConfig::new("netarchive", "/var/tmp/arcvault");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_collection_id_fails() {
        let config = ClientConfig::new("", "/var/tmp/arcvault");
        assert!(config.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_empty_working_dir_fails() {
        let config = ClientConfig::new("netarchive", "");
        assert!(config.validate().unwrap_err().is_invalid_argument());
    }
}
