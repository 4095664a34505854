//! Facade wiring the production collaborators together

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::database::Database;
use crate::database::repositories::SeaOrmRecordTable;
use crate::errors::CacheResult;
use crate::models::{ImageRecord, ImageRequest};
use crate::observability::CacheMetrics;
use crate::pipeline::Orchestrator;
use crate::services::{HttpOptimizationService, OptimizationOptions};
use crate::storage::SandboxedBlobStorage;
use crate::utils::StandardHttpClient;

/// Ready-to-use image cache
#[derive(Clone)]
pub struct ImageCache {
    orchestrator: Orchestrator,
    batch_concurrency: usize,
}

impl ImageCache {
    /// Connect to the database (running migrations), open the blob store and
    /// build the HTTP collaborators described by `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let database = Database::new(&config.database).await?;
        database.migrate().await?;

        let blobs = SandboxedBlobStorage::open(&config.storage.base_directory).await?;
        let downloader = StandardHttpClient::new(&config.http)?;
        let service = HttpOptimizationService::with_client(
            &config.optimizer,
            downloader.inner_client().clone(),
        )?;

        let orchestrator = Orchestrator::assemble(
            Arc::new(SeaOrmRecordTable::new(database.connection())),
            Arc::new(blobs),
            Arc::new(downloader),
            Arc::new(service),
            OptimizationOptions::from(&config.optimizer),
            CacheMetrics::global(),
        );

        info!(
            database_type = %database.database_type,
            blob_root = %config.storage.base_directory.display(),
            optimizer = %config.optimizer.endpoint,
            "Image cache ready"
        );

        Ok(Self::new(orchestrator, config.pipeline.batch_concurrency))
    }

    pub fn new(orchestrator: Orchestrator, batch_concurrency: usize) -> Self {
        Self {
            orchestrator,
            batch_concurrency: batch_concurrency.max(1),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// See [`Orchestrator::get_or_save`].
    pub async fn get_or_save(
        &self,
        site_id: &str,
        source_url: &str,
        image_name: &str,
    ) -> CacheResult<Option<ImageRecord>> {
        self.orchestrator
            .get_or_save(site_id, source_url, image_name)
            .await
    }

    /// Run many requests with at most `batch_concurrency` in flight.
    ///
    /// Returns one result per request, in request order. A failing request
    /// does not affect the others.
    pub async fn get_or_save_all(
        &self,
        requests: Vec<ImageRequest>,
    ) -> Vec<CacheResult<Option<ImageRecord>>> {
        stream::iter(requests)
            .map(|request| async move {
                self.orchestrator
                    .get_or_save(&request.site_id, &request.source_url, &request.image_name)
                    .await
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }
}
