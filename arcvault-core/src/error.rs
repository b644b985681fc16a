//! Error types for the arcvault crates

use thiserror::Error;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors surfaced by the repository client and the batch engine
///
/// Failures are surfaced once and never retried at this layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A caller-supplied argument failed a precondition check
    ///
    /// Always raised before any gateway interaction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transfer, I/O or gateway-level failure
    #[error("{message}")]
    Storage {
        /// Description of the failed operation
        message: String,
        /// Underlying cause, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An administrative operation this client variant does not provide
    ///
    /// A stable contract, not a transient condition: the named operation
    /// fails deterministically on every call.
    #[error("{0} is not supported by this repository client")]
    NotSupported(&'static str),

    /// Declared for credential and checksum-mismatch administrative paths
    ///
    /// Those paths are all `NotSupported` in this client variant, so this
    /// variant is never produced here.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl RepositoryError {
    /// Create an `InvalidArgument` error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a `Storage` error without an underlying cause
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `Storage` error wrapping an underlying cause
    pub fn storage_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Check if this error is an argument precondition failure
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this error is a storage failure
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Check if this error is an unsupported-operation failure
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}
