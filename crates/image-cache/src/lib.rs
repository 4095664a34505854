//! # Image Cache
//!
//! A durable, three-tier cache mapping `(site, source image URL)` to an
//! optimized copy of the image. Each tier is persisted on its own:
//!
//! - a metadata record in a keyed table ([`database`])
//! - the raw source image in a blob store ([`storage`])
//! - the optimized image, produced by an external service, in the same blob store
//!
//! [`pipeline::Orchestrator::get_or_save`] reconciles the three into one
//! record without repeating downloads or optimizations, and stays correct
//! when calls for the same image race or are retried.
//!
//! ```rust,no_run
//! use image_cache::{ImageCache, config::Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let cache = ImageCache::from_config(&config).await?;
//!
//! if let Some(record) = cache
//!     .get_or_save("site-42", "https://cdn.example.com/shoe.png", "products/shoe.png")
//!     .await?
//! {
//!     println!("optimized copy at {}", record.optimized_location);
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use app::ImageCache;
pub use errors::{CacheError, CacheResult};
pub use models::{ImageRecord, ImageRecordKey, ImageRequest};
pub use pipeline::{Orchestrator, PipelineStage};
