use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::RecordTable;
use crate::errors::{CacheError, CacheResult};
use crate::models::{ImageRecord, ImageRecordKey};

/// Record table held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordTable {
    records: Arc<RwLock<HashMap<ImageRecordKey, ImageRecord>>>,
}

impl MemoryRecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of all records, ordered by key
    pub async fn records(&self) -> Vec<ImageRecord> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        records
    }
}

#[async_trait]
impl RecordTable for MemoryRecordTable {
    async fn get(&self, key: &ImageRecordKey) -> CacheResult<Option<ImageRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn insert(&self, record: &ImageRecord) -> CacheResult<()> {
        let mut records = self.records.write().await;
        let key = record.key();
        if records.contains_key(&key) {
            return Err(CacheError::Conflict {
                site_id: key.site_id,
                image_key: key.image_key,
            });
        }
        records.insert(key, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source_url: &str, raw: &str) -> ImageRecord {
        ImageRecord::new(
            "site-1",
            source_url,
            "a.png",
            raw.to_string(),
            "memory://site-1/aaopt/a.png".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_only() {
        let table = MemoryRecordTable::new();
        let first = record("http://cdn/a.png", "memory://site-1/original/a.png");

        table.insert(&first).await.expect("first insert");
        let err = table
            .insert(&record("http://cdn/a.png", "memory://elsewhere"))
            .await
            .expect_err("second insert conflicts");
        assert!(err.is_conflict());

        // the original survives
        let stored = table.get(&first.key()).await.expect("lookup");
        assert_eq!(stored, Some(first));
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_are_partitioned_by_site() {
        let table = MemoryRecordTable::new();
        let one = record("http://cdn/a.png", "raw");
        table.insert(&one).await.expect("insert");

        let other_site = ImageRecordKey::for_source("site-2", "http://cdn/a.png");
        assert_eq!(table.get(&other_site).await.ok(), Some(None));
    }
}
