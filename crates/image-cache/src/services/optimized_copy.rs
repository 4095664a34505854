use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use super::traits::Optimizer;
use super::{persist_artifact, probe_artifact};
use crate::errors::CacheResult;
use crate::observability::CacheMetrics;
use crate::storage::{ArtifactKind, BlobStore};

/// Get-or-create cache for optimized images, stored under `aaopt/`.
///
/// A hit never calls the optimizer. Two callers racing on the same image
/// may both optimize; the last write wins and both results are equivalent.
#[derive(Clone)]
pub struct OptimizedCopyCache {
    blobs: Arc<dyn BlobStore>,
    metrics: CacheMetrics,
}

impl OptimizedCopyCache {
    pub fn new(blobs: Arc<dyn BlobStore>, metrics: CacheMetrics) -> Self {
        Self { blobs, metrics }
    }

    /// Location of the optimized copy, producing it from `raw` if needed.
    pub async fn get_or_create(
        &self,
        site_id: &str,
        image_name: &str,
        raw: Bytes,
        optimizer: &dyn Optimizer,
    ) -> CacheResult<String> {
        let blob_name = ArtifactKind::Optimized.blob_name(image_name);

        if probe_artifact(self.blobs.as_ref(), site_id, &blob_name, ArtifactKind::Optimized)
            .await
            .is_some()
        {
            return self.blobs.location(site_id, &blob_name);
        }

        let optimized = optimizer.optimize(raw, image_name).await?;
        let size = optimized.len() as u64;
        let location = persist_artifact(self.blobs.as_ref(), site_id, &blob_name, optimized).await?;
        self.metrics.record_artifact(ArtifactKind::Optimized, size);
        debug!(site_id, location = %location, bytes = size, "Optimized copy stored");

        Ok(location)
    }
}
