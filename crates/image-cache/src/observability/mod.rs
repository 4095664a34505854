//! Logging and metrics setup
//!
//! [`init_tracing`] installs the global `tracing` subscriber. [`CacheMetrics`]
//! holds the OpenTelemetry instruments the pipeline records into.

use anyhow::Result;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::storage::ArtifactKind;

const METER_NAME: &str = "image-cache";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    info!(json = config.json, "Tracing initialized");
    Ok(())
}

/// Install an SDK meter provider as the global provider.
///
/// Readers and exporters are attached by the embedding application; the
/// returned provider must be kept alive and shut down on exit.
pub fn init_metrics() -> SdkMeterProvider {
    let provider = SdkMeterProvider::builder().build();
    global::set_meter_provider(provider.clone());
    info!("OpenTelemetry meter provider installed");
    provider
}

/// Counters and histograms for the cache pipeline
#[derive(Clone)]
pub struct CacheMetrics {
    pub record_hits: Counter<u64>,
    pub record_misses: Counter<u64>,
    pub raw_downloads: Counter<u64>,
    pub raw_download_failures: Counter<u64>,
    pub optimizations: Counter<u64>,
    pub optimization_failures: Counter<u64>,
    pub record_conflicts: Counter<u64>,
    pub artifact_bytes: Histogram<u64>,
}

impl CacheMetrics {
    /// Instruments from the global meter provider; a no-op until one is installed
    pub fn global() -> Self {
        Self::from_meter(&global::meter(METER_NAME))
    }

    pub fn from_provider(provider: &SdkMeterProvider) -> Self {
        Self::from_meter(&provider.meter(METER_NAME))
    }

    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            record_hits: meter
                .u64_counter("record_hits_total")
                .with_description("Lookups answered by an existing record")
                .build(),
            record_misses: meter
                .u64_counter("record_misses_total")
                .with_description("Lookups that found no record")
                .build(),
            raw_downloads: meter
                .u64_counter("raw_downloads_total")
                .with_description("Source images downloaded")
                .build(),
            raw_download_failures: meter
                .u64_counter("raw_download_failures_total")
                .with_description("Source image downloads that failed")
                .build(),
            optimizations: meter
                .u64_counter("optimizations_total")
                .with_description("Calls made to the optimization service")
                .build(),
            optimization_failures: meter
                .u64_counter("optimization_failures_total")
                .with_description("Optimization calls that failed")
                .build(),
            record_conflicts: meter
                .u64_counter("record_conflicts_total")
                .with_description("Record inserts that lost a race to another writer")
                .build(),
            artifact_bytes: meter
                .u64_histogram("artifact_bytes")
                .with_description("Size of artifacts written to the blob store")
                .with_unit("By")
                .build(),
        }
    }

    pub(crate) fn record_artifact(&self, kind: ArtifactKind, bytes: u64) {
        self.artifact_bytes
            .record(bytes, &[KeyValue::new("kind", kind.to_string())]);
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::global()
    }
}
