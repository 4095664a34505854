/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./image-cache.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 30;

// Storage defaults
pub const DEFAULT_BLOB_BASE_DIRECTORY: &str = "./data/images";

// HTTP downloader defaults
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str = concat!("image-cache/", env!("CARGO_PKG_VERSION"));
// 50MB, no source image should be larger than this
pub const DEFAULT_MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

// Optimization service defaults
pub const DEFAULT_OPTIMIZER_ENDPOINT: &str = "http://localhost:8090";
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 500;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_LOSSY: bool = true;
pub const DEFAULT_QUALITY: u8 = 80;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Pipeline defaults
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

// Environment
pub const ENV_PREFIX: &str = "IMAGE_CACHE_";
pub const DEFAULT_CONFIG_FILE: &str = "image-cache.toml";
