//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image_cache::{
    CacheError, CacheResult, Orchestrator,
    database::repositories::{MemoryRecordTable, RecordTable},
    models::{ImageRecord, ImageRecordKey},
    observability::CacheMetrics,
    services::{OptimizationOptions, OptimizationService, ServiceOutcome},
    storage::{ArtifactKind, BlobStore, MemoryBlobStore},
    utils::HttpDownloader,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub const SITE: &str = "site-1";
pub const SOURCE: &str = "https://images.example.com/catalog/Blue Shoe.png";
pub const NAME: &str = "catalog/blue-shoe.png";
pub const RESULT_PREFIX: &str = "https://optimizer.test/results/";

/// Downloader serving a fixed set of URLs, counting every request per URL.
#[derive(Default)]
pub struct FakeDownloader {
    bodies: Mutex<HashMap<String, Bytes>>,
    failures: Mutex<HashMap<String, u16>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every download waits this long first, widening race windows
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn serve(&self, url: &str, body: &'static [u8]) {
        self.failures.lock().await.remove(url);
        self.bodies
            .lock()
            .await
            .insert(url.to_string(), Bytes::from_static(body));
    }

    pub async fn fail(&self, url: &str, status: u16) {
        self.failures.lock().await.insert(url.to_string(), status);
    }

    pub async fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().await.get(url).copied().unwrap_or(0)
    }

    pub async fn result_downloads(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(url, _)| url.starts_with(RESULT_PREFIX))
            .map(|(_, count)| *count)
            .sum()
    }
}

#[async_trait]
impl HttpDownloader for FakeDownloader {
    async fn download(&self, url: &str) -> CacheResult<Bytes> {
        *self.calls.lock().await.entry(url.to_string()).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.failures.lock().await.get(url) {
            return Err(CacheError::download(url, Some(*status), format!("HTTP error: {status}")));
        }
        self.bodies
            .lock()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| CacheError::download(url, Some(404), "HTTP error: 404"))
    }
}

/// Optimization service that publishes its result to a [`FakeDownloader`]
pub struct FakeOptimizationService {
    results: Arc<FakeDownloader>,
    calls: AtomicUsize,
    failure: Option<String>,
}

impl FakeOptimizationService {
    pub fn new(results: Arc<FakeDownloader>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
            failure: None,
        }
    }

    pub fn failing(results: Arc<FakeDownloader>, detail: &str) -> Self {
        Self {
            failure: Some(detail.to_string()),
            ..Self::new(results)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OptimizationService for FakeOptimizationService {
    async fn process(
        &self,
        bytes: Bytes,
        name: &str,
        _options: &OptimizationOptions,
    ) -> CacheResult<ServiceOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(detail) = &self.failure {
            return Ok(ServiceOutcome::Failed {
                detail: detail.clone(),
            });
        }
        assert!(!bytes.is_empty(), "optimizer must never receive an empty image");

        let result_url = format!("{RESULT_PREFIX}{call}/{name}");
        self.results.serve(&result_url, b"optimized-image").await;
        Ok(ServiceOutcome::Succeeded { result_url })
    }
}

/// Record table that refuses inserts unless both artifacts are already stored
pub struct ArtifactCheckingTable {
    pub inner: MemoryRecordTable,
    pub blobs: MemoryBlobStore,
}

#[async_trait]
impl RecordTable for ArtifactCheckingTable {
    async fn get(&self, key: &ImageRecordKey) -> CacheResult<Option<ImageRecord>> {
        self.inner.get(key).await
    }

    async fn insert(&self, record: &ImageRecord) -> CacheResult<()> {
        for kind in [ArtifactKind::Raw, ArtifactKind::Optimized] {
            let size = self
                .blobs
                .size(&record.site_id, &kind.blob_name(&record.image_name))
                .await?;
            assert!(
                size.is_some_and(|s| s > 0),
                "{kind} artifact missing when record was written"
            );
        }
        self.inner.insert(record).await
    }
}

/// Orchestrator over in-memory stores and the fakes above
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub table: MemoryRecordTable,
    pub blobs: MemoryBlobStore,
    pub downloader: Arc<FakeDownloader>,
    pub service: Arc<FakeOptimizationService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_downloader(FakeDownloader::new())
    }

    pub fn with_downloader(downloader: FakeDownloader) -> Self {
        let downloader = Arc::new(downloader);
        let service = Arc::new(FakeOptimizationService::new(downloader.clone()));
        Self::build(downloader, service)
    }

    pub fn build(downloader: Arc<FakeDownloader>, service: Arc<FakeOptimizationService>) -> Self {
        let table = MemoryRecordTable::new();
        let blobs = MemoryBlobStore::new();
        let checking = ArtifactCheckingTable {
            inner: table.clone(),
            blobs: blobs.clone(),
        };

        let orchestrator = Orchestrator::assemble(
            Arc::new(checking),
            Arc::new(blobs.clone()),
            downloader.clone(),
            service.clone(),
            OptimizationOptions::default(),
            CacheMetrics::global(),
        );

        Self {
            orchestrator,
            table,
            blobs,
            downloader,
            service,
        }
    }

    pub async fn source_downloads(&self) -> usize {
        self.downloader.calls_to(SOURCE).await
    }
}
