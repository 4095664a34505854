//! Error types for the sandboxed blob store.

use std::path::PathBuf;

/// Result type for sandboxed blob operations.
pub type Result<T> = std::result::Result<T, SandboxedBlobError>;

/// Errors that can occur during sandboxed blob operations.
#[derive(Debug, thiserror::Error)]
pub enum SandboxedBlobError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path validation failed - potential security issue
    #[error("Path validation failed: {path:?} - {reason}")]
    PathValidation { path: PathBuf, reason: String },

    /// Container identifier is not a single safe path component
    #[error("Invalid container '{container}': {reason}")]
    InvalidContainer { container: String, reason: String },

    /// Blob does not exist
    #[error("Blob not found: {container}/{name}")]
    NotFound { container: String, name: String },

    /// Directory creation failed
    #[error("Failed to create directory: {path:?} - {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Permissions error
    #[error("Permission denied: {operation} on {path:?}")]
    Permission { operation: String, path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SandboxedBlobError {
    /// Whether this error means the blob simply is not there.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
