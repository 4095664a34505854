//! Blob storage for raw and optimized artifacts
//!
//! Each site owns one container. Artifacts of both kinds live in that
//! container under reserved prefixes:
//!
//! - raw copies under `original/{image_name}`
//! - optimized copies under `aaopt/{image_name}`

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::errors::CacheResult;

pub mod memory;
pub mod sandboxed;

pub use memory::MemoryBlobStore;
pub use sandboxed::SandboxedBlobStorage;

/// Which of the two per-image artifacts a blob holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Raw,
    Optimized,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Raw => "original/",
            ArtifactKind::Optimized => "aaopt/",
        }
    }

    /// Blob name for an image of this kind inside a site container
    pub fn blob_name(&self, image_name: &str) -> String {
        format!("{}{}", self.prefix(), image_name)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Raw => write!(f, "raw"),
            ArtifactKind::Optimized => write!(f, "optimized"),
        }
    }
}

/// Durable named-object store organised in per-site containers.
///
/// Writes must be atomic per blob: a concurrent reader sees either the old
/// content or the new content, never a mix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Length of the blob, `None` when it does not exist
    async fn size(&self, container: &str, name: &str) -> CacheResult<Option<u64>>;

    async fn read(&self, container: &str, name: &str) -> CacheResult<Bytes>;

    /// Replace the blob and return the number of bytes persisted
    async fn write(&self, container: &str, name: &str, bytes: Bytes) -> CacheResult<u64>;

    /// Opaque location URI recorded for the blob
    fn location(&self, container: &str, name: &str) -> CacheResult<String>;
}
