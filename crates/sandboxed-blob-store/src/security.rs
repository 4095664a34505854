//! Security utilities for container and blob name validation.

use crate::error::{Result, SandboxedBlobError};
use std::path::{Component, Path};

/// Sets secure permissions on a directory (Unix only).
pub async fn set_secure_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|_e| SandboxedBlobError::Permission {
                operation: "set secure permissions".to_string(),
                path: path.to_path_buf(),
            })?;
    }

    #[cfg(not(unix))]
    {
        if !path.exists() {
            return Err(SandboxedBlobError::PathValidation {
                path: path.to_path_buf(),
                reason: "Directory does not exist".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates that a container identifier is a single, plain path component.
pub fn validate_container(container: &str) -> Result<()> {
    let invalid = |reason: &str| SandboxedBlobError::InvalidContainer {
        container: container.to_string(),
        reason: reason.to_string(),
    };

    if container.is_empty() {
        return Err(invalid("container cannot be empty"));
    }
    if container.contains('\0') {
        return Err(invalid("container contains null bytes"));
    }
    if container.contains('/') || container.contains('\\') {
        return Err(invalid("container must not contain path separators"));
    }
    if container == "." || container == ".." {
        return Err(invalid("container must not be a relative directory marker"));
    }

    Ok(())
}

/// Validates a blob name lexically: relative, non-empty, no NUL bytes and no
/// `..` or root components.
pub fn validate_blob_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| SandboxedBlobError::PathValidation {
        path: Path::new(name).to_path_buf(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("blob name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(invalid("blob name contains null bytes"));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Err(invalid(
            "absolute paths not allowed - use names relative to the container",
        ));
    }

    let mut normal_components = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal_components += 1,
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("blob name must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("blob name must be relative"));
            }
        }
    }
    if normal_components == 0 || name.ends_with('/') {
        return Err(invalid("blob name must end in a file name"));
    }

    Ok(())
}

/// Validates that a resolved path is within the specified sandbox directory.
///
/// `canonical_base` must already be canonical. The deepest existing ancestor of
/// `path` is canonicalized so symlinks pointing outside the sandbox are caught.
pub fn validate_path_within_sandbox(path: &Path, canonical_base: &Path) -> Result<()> {
    let mut probe = path;
    let resolved = loop {
        if probe.exists() {
            break probe
                .canonicalize()
                .map_err(|e| SandboxedBlobError::PathValidation {
                    path: probe.to_path_buf(),
                    reason: format!("Failed to resolve path: {e}"),
                })?;
        }
        probe = probe
            .parent()
            .ok_or_else(|| SandboxedBlobError::PathValidation {
                path: path.to_path_buf(),
                reason: "Path has no existing ancestor".to_string(),
            })?;
    };

    if !resolved.starts_with(canonical_base) {
        return Err(SandboxedBlobError::PathValidation {
            path: path.to_path_buf(),
            reason: format!(
                "Path escapes sandbox: resolves to '{}' (outside '{}')",
                resolved.display(),
                canonical_base.display()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_validation() {
        assert!(validate_container("site-42").is_ok());
        assert!(validate_container("").is_err());
        assert!(validate_container("..").is_err());
        assert!(validate_container("a/b").is_err());
        assert!(validate_container("a\\b").is_err());
        assert!(validate_container("a\0b").is_err());
    }

    #[test]
    fn test_blob_name_validation() {
        assert!(validate_blob_name("logo.png").is_ok());
        assert!(validate_blob_name("original/products/shoe.png").is_ok());
        assert!(validate_blob_name("./aaopt/x.png").is_ok());

        assert!(validate_blob_name("").is_err());
        assert!(validate_blob_name("/etc/passwd").is_err());
        assert!(validate_blob_name("original/../../etc/passwd").is_err());
        assert!(validate_blob_name("file\0.png").is_err());
        assert!(validate_blob_name("original/").is_err());
        assert!(validate_blob_name(".").is_err());
    }
}
