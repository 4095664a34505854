//! Centralized error handling for the image cache
//!
//! # Error Categories
//!
//! - **Download**: a source image or an optimized result could not be fetched
//! - **Optimization**: the external optimization service reported a failure
//! - **Conflict**: a record already exists for the key being inserted
//! - **Storage integrity**: a persisted or read artifact has an unexpected length
//! - **Storage / Database**: the blob store or record table failed
//!
//! How each category is treated by the pipeline (soft, recovered or fatal) is
//! decided in [`crate::pipeline::Orchestrator`], not here.
//!
//! # Usage
//!
//! ```rust
//! use image_cache::errors::{CacheError, CacheResult};
//!
//! fn example_function(url: &str) -> CacheResult<String> {
//!     if url.is_empty() {
//!         return Err(CacheError::invalid_input("source_url", "must not be empty"));
//!     }
//!     Ok(url.to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using CacheError
pub type CacheResult<T> = Result<T, CacheError>;
