use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{persist_artifact, probe_artifact};
use crate::errors::{CacheError, CacheResult};
use crate::observability::CacheMetrics;
use crate::storage::{ArtifactKind, BlobStore};
use crate::utils::{HttpDownloader, UrlUtils};

/// A raw artifact and where it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCopy {
    pub location: String,
    pub bytes: Bytes,
}

/// Get-or-fetch cache for unmodified source images, stored under `original/`.
#[derive(Clone)]
pub struct RawCopyCache {
    blobs: Arc<dyn BlobStore>,
    downloader: Arc<dyn HttpDownloader>,
    metrics: CacheMetrics,
}

impl RawCopyCache {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        downloader: Arc<dyn HttpDownloader>,
        metrics: CacheMetrics,
    ) -> Self {
        Self {
            blobs,
            downloader,
            metrics,
        }
    }

    /// Return the stored raw copy, downloading it from `source_url` first if
    /// there is none.
    ///
    /// A failed or empty download is a soft failure and yields `Ok(None)`.
    /// Storage failures while persisting, and a stored copy whose length does
    /// not match what the store reported, are errors.
    pub async fn get_or_fetch(
        &self,
        site_id: &str,
        source_url: &str,
        image_name: &str,
    ) -> CacheResult<Option<RawCopy>> {
        let blob_name = ArtifactKind::Raw.blob_name(image_name);

        if let Some(size) =
            probe_artifact(self.blobs.as_ref(), site_id, &blob_name, ArtifactKind::Raw).await
        {
            match self.read_existing(site_id, &blob_name, size).await {
                Ok(copy) => return Ok(Some(copy)),
                Err(e @ CacheError::StorageIntegrity { .. }) => return Err(e),
                Err(e) => {
                    warn!(site_id, blob_name, error = %e, "Stored raw copy unreadable, downloading again");
                }
            }
        }

        let bytes = match self.downloader.download(source_url).await {
            Ok(bytes) if bytes.is_empty() => {
                warn!(
                    site_id,
                    source_url = %UrlUtils::obfuscate_credentials(source_url),
                    "Source returned an empty body"
                );
                self.metrics.raw_download_failures.add(1, &[]);
                return Ok(None);
            }
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    site_id,
                    source_url = %UrlUtils::obfuscate_credentials(source_url),
                    error = %e,
                    "Source download failed"
                );
                self.metrics.raw_download_failures.add(1, &[]);
                return Ok(None);
            }
        };
        self.metrics.raw_downloads.add(1, &[]);

        let size = bytes.len() as u64;
        let location = persist_artifact(self.blobs.as_ref(), site_id, &blob_name, bytes.clone()).await?;
        self.metrics.record_artifact(ArtifactKind::Raw, size);
        debug!(site_id, location = %location, bytes = size, "Raw copy stored");

        Ok(Some(RawCopy { location, bytes }))
    }

    async fn read_existing(&self, site_id: &str, blob_name: &str, size: u64) -> CacheResult<RawCopy> {
        let location = self.blobs.location(site_id, blob_name)?;
        let bytes = self.blobs.read(site_id, blob_name).await?;

        let actual = bytes.len() as u64;
        if actual != size {
            return Err(CacheError::StorageIntegrity {
                location,
                expected: size,
                actual,
            });
        }
        Ok(RawCopy { location, bytes })
    }
}
