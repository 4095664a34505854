//! Behaviour of the get-or-save pipeline over in-memory stores

mod common;

use anyhow::Result;
use bytes::Bytes;
use common::{FakeDownloader, FakeOptimizationService, Harness, NAME, SITE, SOURCE};
use image_cache::{
    CacheError,
    database::repositories::RecordTable,
    models::ImageRecordKey,
    storage::{ArtifactKind, BlobStore},
    utils::normalize,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn repeated_calls_return_same_record_with_single_download_and_optimization() -> Result<()> {
    let harness = Harness::new();
    harness.downloader.serve(SOURCE, b"source-image").await;

    let first = harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await?;
    let second = harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await?;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(harness.source_downloads().await, 1);
    assert_eq!(harness.service.calls(), 1);
    assert_eq!(harness.downloader.result_downloads().await, 1);
    Ok(())
}

#[tokio::test]
async fn record_is_only_visible_after_both_artifacts() -> Result<()> {
    // The harness table asserts both artifacts exist at insert time
    let harness = Harness::new();
    harness.downloader.serve(SOURCE, b"source-image").await;
    let key = ImageRecordKey::for_source(SITE, SOURCE);

    assert_eq!(harness.table.get(&key).await?, None);
    let record = harness
        .orchestrator
        .get_or_save(SITE, SOURCE, NAME)
        .await?
        .expect("record created");

    assert_eq!(harness.table.get(&key).await?, Some(record.clone()));
    assert_eq!(
        harness.blobs.get(SITE, &ArtifactKind::Raw.blob_name(NAME)).await,
        Some(Bytes::from_static(b"source-image"))
    );
    assert_eq!(
        harness.blobs.get(SITE, &ArtifactKind::Optimized.blob_name(NAME)).await,
        Some(Bytes::from_static(b"optimized-image"))
    );
    assert_eq!(record.raw_location, "memory://site-1/original/catalog/blue-shoe.png");
    assert_eq!(record.optimized_location, "memory://site-1/aaopt/catalog/blue-shoe.png");
    assert_eq!(record.image_key, normalize(SOURCE));
    Ok(())
}

#[tokio::test]
async fn zero_length_artifacts_are_rebuilt() -> Result<()> {
    let harness = Harness::new();
    harness.downloader.serve(SOURCE, b"source-image").await;
    for kind in [ArtifactKind::Raw, ArtifactKind::Optimized] {
        harness
            .blobs
            .write(SITE, &kind.blob_name(NAME), Bytes::new())
            .await?;
    }

    let record = harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await?;

    assert!(record.is_some());
    assert_eq!(harness.source_downloads().await, 1);
    assert_eq!(harness.service.calls(), 1);
    for kind in [ArtifactKind::Raw, ArtifactKind::Optimized] {
        let size = harness.blobs.size(SITE, &kind.blob_name(NAME)).await?;
        assert!(size.is_some_and(|s| s > 0), "{kind} artifact still empty");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_converge_on_one_record() -> Result<()> {
    let harness = Arc::new(Harness::with_downloader(FakeDownloader::with_delay(
        Duration::from_millis(20),
    )));
    harness.downloader.serve(SOURCE, b"source-image").await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let harness = harness.clone();
            tokio::spawn(async move { harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await })
        })
        .collect();

    let mut records = Vec::new();
    for handle in handles {
        records.push(handle.await??.expect("every caller gets a record"));
    }

    assert!(records.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(harness.table.len().await, 1);
    assert_eq!(harness.table.records().await, vec![records[0].clone()]);
    Ok(())
}

#[test]
fn normalization_examples() {
    assert_eq!(normalize("My Image!!.png"), "My-Image.png");
    assert_eq!(normalize("  --a--  "), "a");
    assert_eq!(normalize(""), "");
}

#[tokio::test]
async fn failed_source_download_writes_nothing_and_retry_succeeds() -> Result<()> {
    let harness = Harness::new();
    harness.downloader.fail(SOURCE, 500).await;

    let result = harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await?;
    assert_eq!(result, None);
    assert!(harness.table.is_empty().await);
    assert!(harness.blobs.is_empty().await);
    assert_eq!(harness.service.calls(), 0);

    harness.downloader.serve(SOURCE, b"source-image").await;
    let record = harness
        .orchestrator
        .get_or_save(SITE, SOURCE, NAME)
        .await?
        .expect("source is back");

    assert!(!record.raw_location.is_empty());
    assert!(!record.optimized_location.is_empty());
    assert_eq!(
        harness.table.get(&record.key()).await?,
        Some(record.clone())
    );
    assert_eq!(harness.source_downloads().await, 2);
    Ok(())
}

#[tokio::test]
async fn existing_raw_copy_needs_no_download() -> Result<()> {
    let harness = Harness::new();
    harness
        .blobs
        .write(SITE, &ArtifactKind::Raw.blob_name(NAME), Bytes::from_static(b"stored"))
        .await?;

    let record = harness.orchestrator.get_or_save(SITE, SOURCE, NAME).await?;

    assert!(record.is_some());
    assert_eq!(harness.source_downloads().await, 0);
    assert_eq!(harness.service.calls(), 1);
    assert_eq!(harness.table.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn optimization_failure_is_an_error_and_leaves_no_record() -> Result<()> {
    let downloader = Arc::new(FakeDownloader::new());
    let service = Arc::new(FakeOptimizationService::failing(
        downloader.clone(),
        "unsupported colour space",
    ));
    let harness = Harness::build(downloader, service);
    harness.downloader.serve(SOURCE, b"source-image").await;

    let err = harness
        .orchestrator
        .get_or_save(SITE, SOURCE, NAME)
        .await
        .expect_err("optimization failure propagates");

    assert!(matches!(
        err,
        CacheError::Optimization { ref detail, .. } if detail == "unsupported colour space"
    ));
    assert!(harness.table.is_empty().await);
    assert!(
        harness
            .blobs
            .get(SITE, &ArtifactKind::Optimized.blob_name(NAME))
            .await
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn sites_are_cached_independently() -> Result<()> {
    let harness = Harness::new();
    harness.downloader.serve(SOURCE, b"source-image").await;

    let one = harness.orchestrator.get_or_save("site-1", SOURCE, NAME).await?;
    let two = harness.orchestrator.get_or_save("site-2", SOURCE, NAME).await?;

    let (one, two) = (one.expect("site-1 record"), two.expect("site-2 record"));
    assert_ne!(one.raw_location, two.raw_location);
    assert_eq!(harness.table.len().await, 2);
    assert_eq!(harness.source_downloads().await, 2);
    Ok(())
}
