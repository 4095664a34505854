//! Idempotent get-or-save
//!
//! Steps run strictly in this order for every call:
//!
//! 1. record lookup: an existing record is returned as is
//! 2. raw acquire: reuse or download the source image; a failed download ends
//!    the call with `Ok(None)` and nothing written
//! 3. optimize acquire: reuse or produce the optimized copy; errors propagate
//! 4. record persist: insert the record last, so a visible record always has
//!    both artifacts behind it
//!
//! A conflict in step 4 means another caller finished first; its record is
//! re-read and returned. Steps 2 and 3 check before they write, so a retry
//! after a crash between steps 3 and 4 redoes no work.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::stage::PipelineStage;
use crate::database::repositories::RecordTable;
use crate::errors::{CacheError, CacheResult};
use crate::models::{ImageRecord, MAX_SITE_ID_LEN};
use crate::observability::CacheMetrics;
use crate::services::{
    ImageOptimizer, OptimizationOptions, OptimizationService, OptimizedCopyCache, Optimizer,
    RawCopyCache, RecordStore,
};
use crate::storage::BlobStore;
use crate::utils::{HttpDownloader, UrlUtils};

#[derive(Clone)]
pub struct Orchestrator {
    records: RecordStore,
    raw: RawCopyCache,
    optimized: OptimizedCopyCache,
    optimizer: Arc<dyn Optimizer>,
    metrics: CacheMetrics,
}

impl Orchestrator {
    pub fn new(
        records: RecordStore,
        raw: RawCopyCache,
        optimized: OptimizedCopyCache,
        optimizer: Arc<dyn Optimizer>,
        metrics: CacheMetrics,
    ) -> Self {
        Self {
            records,
            raw,
            optimized,
            optimizer,
            metrics,
        }
    }

    /// Wire the tiers over a set of collaborators. Both artifact caches share
    /// `blobs`; the downloader serves source images and optimized results.
    pub fn assemble(
        table: Arc<dyn RecordTable>,
        blobs: Arc<dyn BlobStore>,
        downloader: Arc<dyn HttpDownloader>,
        service: Arc<dyn OptimizationService>,
        options: OptimizationOptions,
        metrics: CacheMetrics,
    ) -> Self {
        let optimizer = ImageOptimizer::new(service, downloader.clone(), options, metrics.clone());
        Self::new(
            RecordStore::new(table),
            RawCopyCache::new(blobs.clone(), downloader, metrics.clone()),
            OptimizedCopyCache::new(blobs, metrics.clone()),
            Arc::new(optimizer),
            metrics,
        )
    }

    /// Record for `source_url` within `site_id`, creating the artifacts and
    /// the record if needed.
    ///
    /// `Ok(None)` means the source image could not be downloaded; nothing was
    /// written and the caller may retry later. Optimization failures, failed
    /// result downloads and storage integrity violations are errors.
    pub async fn get_or_save(
        &self,
        site_id: &str,
        source_url: &str,
        image_name: &str,
    ) -> CacheResult<Option<ImageRecord>> {
        if site_id.len() > MAX_SITE_ID_LEN {
            return Err(CacheError::invalid_input(
                "site_id",
                format!("longer than {MAX_SITE_ID_LEN} bytes"),
            ));
        }

        {
            let _stage = PipelineStage::RecordLookup.enter(site_id, image_name);
            match self.records.get_if_exists(site_id, source_url).await {
                Ok(Some(record)) => {
                    self.metrics.record_hits.add(1, &[]);
                    return Ok(Some(record));
                }
                Ok(None) => self.metrics.record_misses.add(1, &[]),
                Err(e) => {
                    self.metrics.record_misses.add(1, &[]);
                    warn!(site_id, image_name, error = %e, "Record lookup failed, treating as miss");
                }
            }
        }

        let raw = {
            let _stage = PipelineStage::RawAcquire.enter(site_id, image_name);
            match self.raw.get_or_fetch(site_id, source_url, image_name).await? {
                Some(raw) => raw,
                None => {
                    warn!(
                        site_id,
                        image_name,
                        source_url = %UrlUtils::obfuscate_credentials(source_url),
                        "Source image unavailable, nothing cached"
                    );
                    return Ok(None);
                }
            }
        };

        let optimized_location = {
            let _stage = PipelineStage::OptimizeAcquire.enter(site_id, image_name);
            self.optimized
                .get_or_create(site_id, image_name, raw.bytes, self.optimizer.as_ref())
                .await
                .inspect_err(|e| {
                    error!(site_id, image_name, error = %e, "Optimized copy unavailable");
                })?
        };

        let _stage = PipelineStage::RecordPersist.enter(site_id, image_name);
        let record = ImageRecord::new(
            site_id,
            source_url,
            image_name,
            raw.location,
            optimized_location,
        );

        match self.records.create_if_absent(record).await {
            Ok(record) => {
                info!(
                    site_id,
                    image_name,
                    image_key = %record.image_key,
                    "Image cached"
                );
                Ok(Some(record))
            }
            Err(conflict @ CacheError::Conflict { .. }) => {
                self.metrics.record_conflicts.add(1, &[]);
                debug!(site_id, image_name, "Record created concurrently, re-reading");
                match self.records.get_if_exists(site_id, source_url).await? {
                    Some(existing) => Ok(Some(existing)),
                    // only possible if the winning record was removed out of band
                    None => Err(conflict),
                }
            }
            Err(e) => Err(e),
        }
    }
}
