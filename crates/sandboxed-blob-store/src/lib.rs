//! # Sandboxed Blob Store
//!
//! A filesystem-backed blob store confined to a single base directory.
//!
//! Blobs are addressed by a `(container, name)` pair. A container is a single
//! directory directly below the base directory; a name is a relative path inside
//! that container and may contain `/` separated segments
//! (e.g. `original/products/shoe.png`).
//!
//! ## Features
//!
//! - **Sandboxed Operations**: every resolved path must stay inside the base directory
//! - **Container Isolation**: container identifiers are single path components
//! - **Path Validation**: empty names, NUL bytes, absolute paths and `..` segments are rejected
//! - **Symlink Safety**: parents that resolve outside the sandbox are refused
//! - **Atomic Writes**: blobs are written to a temporary sibling, flushed and renamed into place,
//!   so a reader never observes a partially written blob
//!
//! ## Basic Usage
//!
//! ```rust
//! use sandboxed_blob_store::SandboxedBlobStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SandboxedBlobStore::builder()
//!     .base_directory("/var/cache/images")
//!     .build()
//!     .await?;
//!
//! let written = store.write("site-1", "original/logo.png", b"png bytes").await?;
//! assert_eq!(written, 9);
//!
//! if let Some(size) = store.size("site-1", "original/logo.png").await? {
//!     let bytes = store.read("site-1", "original/logo.png").await?;
//!     assert_eq!(bytes.len() as u64, size);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! **Blocked operations:**
//! ```rust,ignore
//! // store.write("site-1", "../../etc/passwd", "evil").await?;   // Escapes container
//! // store.write("../site-2", "logo.png", "evil").await?;        // Invalid container
//! // store.write("site-1", "/etc/passwd", "evil").await?;        // Absolute path
//! ```

pub mod error;
pub mod security;
pub mod store;

pub use error::{Result, SandboxedBlobError};
pub use store::{SandboxedBlobStore, SandboxedBlobStoreBuilder};
