//! Error type definitions for the image cache

use thiserror::Error;

/// Top-level cache error type
#[derive(Error, Debug)]
pub enum CacheError {
    /// Fetching a source image or an optimized result failed
    #[error("Download failed: {url} - {message}")]
    Download {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The optimization service reported a failure
    #[error("Optimization failed for '{image_name}': {detail}")]
    Optimization { image_name: String, detail: String },

    /// Insert-if-absent found an existing record
    #[error("Record already exists: {site_id}/{image_key}")]
    Conflict { site_id: String, image_key: String },

    /// Persisted or read artifact length differs from what was expected
    #[error("Storage integrity violated at {location}: expected {expected} bytes, found {actual}")]
    StorageIntegrity {
        location: String,
        expected: u64,
        actual: u64,
    },

    /// Blob store operation failed
    #[error("Storage error: {container}/{name} - {message}")]
    Storage {
        container: String,
        name: String,
        message: String,
    },

    /// Database errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// External service could not be reached or answered unexpectedly
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// Invalid caller input
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CacheError {
    /// Create a download error
    pub fn download<U: Into<String>, M: Into<String>>(
        url: U,
        status: Option<u16>,
        message: M,
    ) -> Self {
        Self::Download {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an optimization error
    pub fn optimization<N: Into<String>, D: Into<String>>(image_name: N, detail: D) -> Self {
        Self::Optimization {
            image_name: image_name.into(),
            detail: detail.into(),
        }
    }

    /// Create a storage error for a blob
    pub fn storage<M: Into<String>>(container: &str, name: &str, message: M) -> Self {
        Self::Storage {
            container: container.to_string(),
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_download(&self) -> bool {
        matches!(self, Self::Download { .. })
    }
}
