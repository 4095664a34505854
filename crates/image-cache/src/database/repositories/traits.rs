//! Keyed durable table abstraction

use async_trait::async_trait;

use crate::errors::CacheResult;
use crate::models::{ImageRecord, ImageRecordKey};

/// Point lookup and insert-if-absent keyed by `(site_id, image_key)`.
///
/// Implementations must give read-after-write consistency within a site:
/// once `insert` returns, `get` for the same key observes the record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordTable: Send + Sync {
    /// `Ok(None)` is a true miss; backend failures are `Err`.
    async fn get(&self, key: &ImageRecordKey) -> CacheResult<Option<ImageRecord>>;

    /// Insert a new record. Never overwrites: an existing key fails with
    /// [`CacheError::Conflict`](crate::errors::CacheError::Conflict).
    async fn insert(&self, record: &ImageRecord) -> CacheResult<()>;
}
