use std::sync::Arc;
use tracing::debug;

use crate::database::repositories::RecordTable;
use crate::errors::CacheResult;
use crate::models::{ImageRecord, ImageRecordKey};

/// Get-or-create access to image records, keyed by the normalized source URL.
#[derive(Clone)]
pub struct RecordStore {
    table: Arc<dyn RecordTable>,
}

impl RecordStore {
    pub fn new(table: Arc<dyn RecordTable>) -> Self {
        Self { table }
    }

    /// Look up the record for `source_url` within a site.
    ///
    /// `Ok(None)` means no record exists. Backend failures are returned as
    /// errors rather than folded into a miss.
    pub async fn get_if_exists(
        &self,
        site_id: &str,
        source_url: &str,
    ) -> CacheResult<Option<ImageRecord>> {
        let key = ImageRecordKey::for_source(site_id, source_url);
        let record = self.table.get(&key).await?;
        debug!(site_id, image_key = %key.image_key, hit = record.is_some(), "Record lookup");
        Ok(record)
    }

    /// Insert `record` unless its key is taken.
    ///
    /// An existing record is never overwritten; the insert fails with
    /// [`CacheError::Conflict`](crate::errors::CacheError::Conflict).
    pub async fn create_if_absent(&self, record: ImageRecord) -> CacheResult<ImageRecord> {
        self.table.insert(&record).await?;
        Ok(record)
    }
}
