//! SeaORM-backed record table

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, Set, SqlErr};
use std::sync::Arc;
use tracing::debug;

use super::traits::RecordTable;
use crate::entities::{image_records, prelude::ImageRecords};
use crate::errors::{CacheError, CacheResult};
use crate::models::{ImageRecord, ImageRecordKey};

/// Record table stored in the `image_records` table
#[derive(Clone)]
pub struct SeaOrmRecordTable {
    connection: Arc<DatabaseConnection>,
}

impl SeaOrmRecordTable {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

impl From<image_records::Model> for ImageRecord {
    fn from(model: image_records::Model) -> Self {
        Self {
            site_id: model.site_id,
            image_key: model.image_key,
            source_url: model.source_url,
            image_name: model.image_name,
            raw_location: model.raw_location,
            optimized_location: model.optimized_location,
            created_at: model.created_at,
        }
    }
}

impl ImageRecord {
    pub fn into_active_model(self) -> image_records::ActiveModel {
        image_records::ActiveModel {
            site_id: Set(self.site_id),
            image_key: Set(self.image_key),
            source_url: Set(self.source_url),
            image_name: Set(self.image_name),
            raw_location: Set(self.raw_location),
            optimized_location: Set(self.optimized_location),
            created_at: Set(self.created_at),
        }
    }
}

#[async_trait]
impl RecordTable for SeaOrmRecordTable {
    async fn get(&self, key: &ImageRecordKey) -> CacheResult<Option<ImageRecord>> {
        let model = ImageRecords::find_by_id((key.site_id.clone(), key.image_key.clone()))
            .one(&*self.connection)
            .await?;
        Ok(model.map(ImageRecord::from))
    }

    async fn insert(&self, record: &ImageRecord) -> CacheResult<()> {
        let key = record.key();
        let result = ImageRecords::insert(record.clone().into_active_model())
            .exec_without_returning(&*self.connection)
            .await;

        match result {
            Ok(_) => {
                debug!(site_id = %key.site_id, image_key = %key.image_key, "Record inserted");
                Ok(())
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(CacheError::Conflict {
                    site_id: key.site_id,
                    image_key: key.image_key,
                }),
                _ => Err(e.into()),
            },
        }
    }
}
