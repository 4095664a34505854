//! Optimization adapter
//!
//! Hides the service protocol behind [`Optimizer::optimize`]: run the job,
//! then fetch the result with the same all-or-nothing downloader used for
//! source images.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error};

use super::traits::{OptimizationOptions, OptimizationService, Optimizer, ServiceOutcome};
use crate::errors::{CacheError, CacheResult};
use crate::observability::CacheMetrics;
use crate::utils::{HttpDownloader, UrlUtils};

#[derive(Clone)]
pub struct ImageOptimizer {
    service: Arc<dyn OptimizationService>,
    downloader: Arc<dyn HttpDownloader>,
    options: OptimizationOptions,
    metrics: CacheMetrics,
}

impl ImageOptimizer {
    pub fn new(
        service: Arc<dyn OptimizationService>,
        downloader: Arc<dyn HttpDownloader>,
        options: OptimizationOptions,
        metrics: CacheMetrics,
    ) -> Self {
        Self {
            service,
            downloader,
            options,
            metrics,
        }
    }

    async fn run(&self, bytes: Bytes, image_name: &str) -> CacheResult<Bytes> {
        let input_size = bytes.len();
        let outcome = self.service.process(bytes, image_name, &self.options).await?;

        let result_url = match outcome {
            ServiceOutcome::Succeeded { result_url } => result_url,
            ServiceOutcome::Failed { detail } => {
                return Err(CacheError::optimization(image_name, detail));
            }
        };

        debug!(
            image_name,
            result_url = %UrlUtils::obfuscate_credentials(&result_url),
            "Optimization finished, fetching result"
        );
        let optimized = self.downloader.download(&result_url).await?;

        if optimized.is_empty() {
            return Err(CacheError::optimization(
                image_name,
                "service returned an empty result",
            ));
        }

        debug!(
            image_name,
            input_bytes = input_size,
            output_bytes = optimized.len(),
            "Optimized image retrieved"
        );
        Ok(optimized)
    }
}

#[async_trait]
impl Optimizer for ImageOptimizer {
    /// Fails with `Optimization` when the service reports failure and with
    /// `Download` when the result cannot be fetched completely.
    async fn optimize(&self, bytes: Bytes, image_name: &str) -> CacheResult<Bytes> {
        self.metrics.optimizations.add(1, &[]);

        let result = self.run(bytes, image_name).await;
        if let Err(e) = &result {
            self.metrics.optimization_failures.add(1, &[]);
            error!(image_name, error = %e, "Optimization failed");
        }
        result
    }
}
