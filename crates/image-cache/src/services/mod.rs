//! Cache tiers and the optimization adapter
//!
//! Each tier owns exactly one artifact: [`RecordStore`] the metadata record,
//! [`RawCopyCache`] the raw copy and [`OptimizedCopyCache`] the optimized copy.
//! None of them looks at another tier's state.

use tracing::{debug, warn};

use crate::errors::{CacheError, CacheResult};
use crate::storage::{ArtifactKind, BlobStore};

pub mod optimization_client;
pub mod optimized_copy;
pub mod optimizer;
pub mod raw_copy;
pub mod record_store;
pub mod traits;

pub use optimization_client::HttpOptimizationService;
pub use optimized_copy::OptimizedCopyCache;
pub use optimizer::ImageOptimizer;
pub use raw_copy::{RawCopy, RawCopyCache};
pub use record_store::RecordStore;
pub use traits::{OptimizationOptions, OptimizationService, Optimizer, ServiceOutcome};

/// Size of an existing, non-empty artifact.
///
/// Zero-length blobs are left over by failed writes and count as absent. A
/// failed existence check also counts as absent: the caller then rebuilds the
/// artifact, which is safe because writes replace the blob atomically.
pub(crate) async fn probe_artifact(
    blobs: &dyn BlobStore,
    site_id: &str,
    blob_name: &str,
    kind: ArtifactKind,
) -> Option<u64> {
    match blobs.size(site_id, blob_name).await {
        Ok(Some(0)) => {
            debug!(site_id, blob_name, %kind, "Ignoring zero-length artifact");
            None
        }
        Ok(Some(size)) => {
            debug!(site_id, blob_name, %kind, bytes = size, hit = true, "Artifact cache hit");
            Some(size)
        }
        Ok(None) => {
            debug!(site_id, blob_name, %kind, hit = false, "Artifact cache miss");
            None
        }
        Err(e) => {
            warn!(site_id, blob_name, %kind, error = %e, "Artifact existence check failed, treating as miss");
            None
        }
    }
}

/// Persist an artifact and verify the store kept every byte.
pub(crate) async fn persist_artifact(
    blobs: &dyn BlobStore,
    site_id: &str,
    blob_name: &str,
    bytes: bytes::Bytes,
) -> CacheResult<String> {
    let expected = bytes.len() as u64;
    let location = blobs.location(site_id, blob_name)?;
    let written = blobs.write(site_id, blob_name, bytes).await?;

    if written != expected {
        return Err(CacheError::StorageIntegrity {
            location,
            expected,
            actual: written,
        });
    }
    Ok(location)
}
