use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::BlobStore;
use crate::errors::{CacheError, CacheResult};

/// In-process blob store, for tests and embedding without a filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<(String, String), Bytes>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs across all containers
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Raw content of a blob, if present
    pub async fn get(&self, container: &str, name: &str) -> Option<Bytes> {
        self.blobs
            .read()
            .await
            .get(&(container.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn size(&self, container: &str, name: &str) -> CacheResult<Option<u64>> {
        Ok(self.get(container, name).await.map(|b| b.len() as u64))
    }

    async fn read(&self, container: &str, name: &str) -> CacheResult<Bytes> {
        self.get(container, name)
            .await
            .ok_or_else(|| CacheError::storage(container, name, "blob not found"))
    }

    async fn write(&self, container: &str, name: &str, bytes: Bytes) -> CacheResult<u64> {
        let written = bytes.len() as u64;
        self.blobs
            .write()
            .await
            .insert((container.to_string(), name.to_string()), bytes);
        Ok(written)
    }

    fn location(&self, container: &str, name: &str) -> CacheResult<String> {
        Ok(format!("memory://{container}/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.size("site-1", "original/a.png").await.ok(), Some(None));

        let written = store
            .write("site-1", "original/a.png", Bytes::from_static(b"abc"))
            .await
            .expect("write succeeds");
        assert_eq!(written, 3);
        assert_eq!(store.size("site-1", "original/a.png").await.ok(), Some(Some(3)));
        assert_eq!(
            store.read("site-1", "original/a.png").await.ok(),
            Some(Bytes::from_static(b"abc"))
        );
        assert!(store.read("site-2", "original/a.png").await.is_err());
        assert_eq!(
            store.location("site-1", "original/a.png").ok().as_deref(),
            Some("memory://site-1/original/a.png")
        );
    }
}
