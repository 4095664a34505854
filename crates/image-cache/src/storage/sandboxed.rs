use async_trait::async_trait;
use bytes::Bytes;
use sandboxed_blob_store::{SandboxedBlobError, SandboxedBlobStore};
use std::path::Path;

use super::BlobStore;
use crate::errors::{CacheError, CacheResult};
use crate::utils::UrlUtils;

/// Filesystem blob store rooted at a sandboxed base directory.
///
/// Locations are `file://` URLs of the blob inside the sandbox.
#[derive(Debug, Clone)]
pub struct SandboxedBlobStorage {
    inner: SandboxedBlobStore,
}

impl SandboxedBlobStorage {
    /// Create (if needed) and lock down `base_directory`.
    pub async fn open<P: AsRef<Path>>(base_directory: P) -> CacheResult<Self> {
        let inner = SandboxedBlobStore::builder()
            .base_directory(base_directory.as_ref())
            .build()
            .await
            .map_err(|e| {
                CacheError::configuration(format!(
                    "Failed to open blob store at {}: {e}",
                    base_directory.as_ref().display()
                ))
            })?;
        Ok(Self { inner })
    }

    pub fn base_directory(&self) -> &Path {
        self.inner.base_directory()
    }
}

fn map_error(container: &str, name: &str, error: SandboxedBlobError) -> CacheError {
    CacheError::storage(container, name, error.to_string())
}

#[async_trait]
impl BlobStore for SandboxedBlobStorage {
    async fn size(&self, container: &str, name: &str) -> CacheResult<Option<u64>> {
        self.inner
            .size(container, name)
            .await
            .map_err(|e| map_error(container, name, e))
    }

    async fn read(&self, container: &str, name: &str) -> CacheResult<Bytes> {
        self.inner
            .read(container, name)
            .await
            .map(Bytes::from)
            .map_err(|e| map_error(container, name, e))
    }

    async fn write(&self, container: &str, name: &str, bytes: Bytes) -> CacheResult<u64> {
        self.inner
            .write(container, name, &bytes)
            .await
            .map_err(|e| map_error(container, name, e))
    }

    fn location(&self, container: &str, name: &str) -> CacheResult<String> {
        let path = self
            .inner
            .full_path(container, name)
            .map_err(|e| map_error(container, name, e))?;
        UrlUtils::file_url(&path).ok_or_else(|| {
            CacheError::storage(container, name, "blob path cannot be expressed as a file URL")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sandboxed_storage_adapter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = SandboxedBlobStorage::open(dir.path()).await.expect("store opens");

        assert_eq!(storage.size("site-1", "aaopt/a.png").await.ok(), Some(None));

        let written = storage
            .write("site-1", "aaopt/a.png", Bytes::from_static(b"optimized"))
            .await
            .expect("write succeeds");
        assert_eq!(written, 9);
        assert_eq!(storage.size("site-1", "aaopt/a.png").await.ok(), Some(Some(9)));
        assert_eq!(
            storage.read("site-1", "aaopt/a.png").await.ok(),
            Some(Bytes::from_static(b"optimized"))
        );

        let location = storage.location("site-1", "aaopt/a.png").expect("location");
        assert!(location.starts_with("file://"));
        assert!(location.ends_with("/site-1/aaopt/a.png"));
    }

    #[tokio::test]
    async fn test_invalid_names_become_storage_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = SandboxedBlobStorage::open(dir.path()).await.expect("store opens");

        let err = storage
            .write("site-1", "original/../../escape.png", Bytes::from_static(b"x"))
            .await
            .expect_err("traversal rejected");
        assert!(matches!(err, CacheError::Storage { .. }));
        assert!(storage.location("../site", "a.png").is_err());
    }
}
