//! Core sandboxed blob store implementation.

use crate::{
    error::{Result, SandboxedBlobError},
    security::{
        set_secure_permissions, validate_blob_name, validate_container,
        validate_path_within_sandbox,
    },
};

use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

/// Filesystem blob store confined to a base directory.
#[derive(Clone, Debug)]
pub struct SandboxedBlobStore {
    canonical_base: PathBuf,
}

impl SandboxedBlobStore {
    /// Create a new builder for configuring the store.
    #[must_use]
    pub fn builder() -> SandboxedBlobStoreBuilder {
        SandboxedBlobStoreBuilder::new()
    }

    /// The canonical base directory of the sandbox.
    #[must_use]
    pub fn base_directory(&self) -> &Path {
        &self.canonical_base
    }

    /// Atomically write a blob, replacing any previous content.
    ///
    /// The bytes go to a temporary sibling first, are flushed to disk and then
    /// renamed over the target. Returns the size of the blob as persisted.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The container or name is invalid or escapes the sandbox
    /// - Parent directories cannot be created
    /// - The underlying write, flush or rename fails
    pub async fn write<C: AsRef<[u8]>>(&self, container: &str, name: &str, contents: C) -> Result<u64> {
        let target = self.resolve(container, name)?;

        if let Some(parent) = target.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SandboxedBlobError::DirectoryCreation {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        // Parents now exist, so symlinked directories are resolvable.
        validate_path_within_sandbox(&target, &self.canonical_base)?;

        let temp_path = Self::temp_path_for(&target)?;
        let contents = contents.as_ref();

        let write_result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &target).await
        }
        .await;

        if let Err(e) = write_result {
            if let Err(cleanup) = fs::remove_file(&temp_path).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "failed to remove temporary blob after write failure"
                );
            }
            return Err(e.into());
        }

        let persisted = fs::metadata(&target).await?.len();
        tracing::trace!(
            container,
            name,
            bytes = persisted,
            "blob written"
        );

        Ok(persisted)
    }

    /// Read an entire blob into memory.
    ///
    /// # Errors
    /// Returns [`SandboxedBlobError::NotFound`] if the blob does not exist, or
    /// another error if validation or the read fails.
    pub async fn read(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve_existing(container, name)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SandboxedBlobError::NotFound {
                    container: container.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of a blob in bytes, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns an error if validation fails or metadata cannot be read for a
    /// reason other than absence.
    pub async fn size(&self, container: &str, name: &str) -> Result<Option<u64>> {
        let path = self.resolve_existing(container, name)?;

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a blob exists (regardless of its length).
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub async fn exists(&self, container: &str, name: &str) -> Result<bool> {
        Ok(self.size(container, name).await?.is_some())
    }

    /// Absolute filesystem path of a blob inside the sandbox.
    ///
    /// # Errors
    /// Returns an error if the container or name is invalid.
    pub fn full_path(&self, container: &str, name: &str) -> Result<PathBuf> {
        self.resolve(container, name)
    }

    /// Lexically validate and join a blob path without touching the filesystem.
    fn resolve(&self, container: &str, name: &str) -> Result<PathBuf> {
        validate_container(container)?;
        validate_blob_name(name)?;
        Ok(self.canonical_base.join(container).join(name))
    }

    /// Resolve a path for reading, also checking that existing ancestors stay
    /// inside the sandbox.
    fn resolve_existing(&self, container: &str, name: &str) -> Result<PathBuf> {
        let path = self.resolve(container, name)?;
        validate_path_within_sandbox(&path, &self.canonical_base)?;
        Ok(path)
    }

    fn temp_path_for(target: &Path) -> Result<PathBuf> {
        let file_name = target
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| SandboxedBlobError::PathValidation {
                path: target.to_path_buf(),
                reason: "Invalid filename".to_string(),
            })?;
        Ok(target.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple())))
    }
}

/// Builder for configuring a `SandboxedBlobStore`.
#[derive(Debug, Default)]
pub struct SandboxedBlobStoreBuilder {
    base_directory: Option<PathBuf>,
}

impl SandboxedBlobStoreBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the base directory for blob storage.
    #[must_use]
    pub fn base_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base_directory = Some(path.into());
        self
    }

    /// Build the `SandboxedBlobStore`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Base directory is not set
    /// - Base directory cannot be created, secured or canonicalized
    pub async fn build(self) -> Result<SandboxedBlobStore> {
        let base_dir = self
            .base_directory
            .ok_or_else(|| SandboxedBlobError::Configuration {
                message: "Base directory is required".to_string(),
            })?;

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| SandboxedBlobError::DirectoryCreation {
                path: base_dir.clone(),
                source: e,
            })?;

        set_secure_permissions(&base_dir).await?;

        let canonical_base =
            base_dir
                .canonicalize()
                .map_err(|e| SandboxedBlobError::PathValidation {
                    path: base_dir.clone(),
                    reason: format!("Failed to canonicalize base directory: {e}"),
                })?;

        tracing::info!(
            base_dir = %canonical_base.display(),
            "SandboxedBlobStore initialized"
        );

        Ok(SandboxedBlobStore { canonical_base })
    }
}
