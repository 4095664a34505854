use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::errors::{CacheError, CacheResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_database_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the sandboxed blob store; one subdirectory per site
    #[serde(default = "default_blob_base_directory")]
    pub base_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    /// Total request timeout; `None` only bounds the connection phase
    #[serde(
        default = "default_http_request_timeout",
        with = "duration_serde::option_duration"
    )]
    pub request_timeout: Option<Duration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_optimizer_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_interval", with = "duration_serde::duration")]
    pub poll_interval: Duration,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_lossy")]
    pub lossy: bool,
    #[serde(default = "default_quality")]
    pub quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrent `get_or_save` calls in a batch
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_database_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS)
}

fn default_blob_base_directory() -> PathBuf {
    PathBuf::from(DEFAULT_BLOB_BASE_DIRECTORY)
}

fn default_http_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_HTTP_CONNECT_TIMEOUT_SECS)
}

fn default_http_request_timeout() -> Option<Duration> {
    Some(Duration::from_secs(DEFAULT_HTTP_REQUEST_TIMEOUT_SECS))
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_body_bytes() -> Option<u64> {
    Some(DEFAULT_MAX_BODY_BYTES)
}

fn default_optimizer_endpoint() -> String {
    DEFAULT_OPTIMIZER_ENDPOINT.to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MILLIS)
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

fn default_lossy() -> bool {
    DEFAULT_LOSSY
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_batch_concurrency() -> usize {
    DEFAULT_BATCH_CONCURRENCY
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout: default_database_connect_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_directory: default_blob_base_directory(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_http_connect_timeout(),
            request_timeout: default_http_request_timeout(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_optimizer_endpoint(),
            api_key: None,
            poll_interval: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            lossy: default_lossy(),
            quality: default_quality(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl Config {
    /// Load configuration from `IMAGE_CACHE_CONFIG` (or `image-cache.toml`)
    /// layered under `IMAGE_CACHE_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config_file = std::env::var(format!("{ENV_PREFIX}CONFIG"))
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Defaults, then the TOML file if it exists, then environment overrides
    /// such as `IMAGE_CACHE_OPTIMIZER__QUALITY=70`.
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> anyhow::Result<Self> {
        let config_file = config_file.as_ref();
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_file.exists() {
            info!(path = %config_file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(config_file));
        } else {
            info!(path = %config_file.display(), "Configuration file not found, using defaults");
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> CacheResult<()> {
        if self.optimizer.endpoint.trim().is_empty() {
            return Err(CacheError::configuration("optimizer.endpoint must not be empty"));
        }
        if self.optimizer.max_poll_attempts == 0 {
            return Err(CacheError::configuration(
                "optimizer.max_poll_attempts must be at least 1",
            ));
        }
        if !(1..=100).contains(&self.optimizer.quality) {
            return Err(CacheError::configuration(format!(
                "optimizer.quality must be between 1 and 100, got {}",
                self.optimizer.quality
            )));
        }
        if self.pipeline.batch_concurrency == 0 {
            return Err(CacheError::configuration(
                "pipeline.batch_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}
