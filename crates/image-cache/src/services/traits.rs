//! Collaborator ports used by the cache tiers

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::config::defaults::{DEFAULT_LOSSY, DEFAULT_QUALITY};
use crate::errors::CacheResult;

/// Options forwarded to the optimization service with every job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationOptions {
    pub lossy: bool,
    /// 1..=100
    pub quality: u8,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            lossy: DEFAULT_LOSSY,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl From<&OptimizerConfig> for OptimizationOptions {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            lossy: config.lossy,
            quality: config.quality,
        }
    }
}

/// Terminal state of an optimization job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// The optimized image can be fetched from `result_url`
    Succeeded { result_url: String },
    /// The service rejected or failed the job
    Failed { detail: String },
}

/// External optimization service: submit, wait for completion, report outcome.
///
/// `Err` is reserved for failing to talk to the service; a job the service
/// itself failed is `Ok(ServiceOutcome::Failed)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OptimizationService: Send + Sync {
    async fn process(
        &self,
        bytes: Bytes,
        name: &str,
        options: &OptimizationOptions,
    ) -> CacheResult<ServiceOutcome>;
}

/// Turns raw image bytes into optimized image bytes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Optimizer: Send + Sync {
    async fn optimize(&self, bytes: Bytes, image_name: &str) -> CacheResult<Bytes>;
}
