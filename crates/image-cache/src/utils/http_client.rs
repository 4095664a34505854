use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{CacheError, CacheResult};
use crate::utils::url::UrlUtils;

/// Fetches a URL and returns the complete response body.
///
/// Implementations must never return a partial body: any non-2xx status,
/// transport error or truncated transfer is a [`CacheError::Download`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpDownloader: Send + Sync {
    async fn download(&self, url: &str) -> CacheResult<Bytes>;
}

/// reqwest-backed downloader
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
    max_body_bytes: Option<u64>,
}

impl StandardHttpClient {
    /// Build a client from the `[http]` configuration section
    pub fn new(config: &HttpConfig) -> CacheResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            CacheError::configuration(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Client with only a connection timeout and no body limit
    pub fn with_connection_timeout(connect_timeout: Duration) -> CacheResult<Self> {
        Self::new(&HttpConfig {
            connect_timeout,
            request_timeout: None,
            max_body_bytes: None,
            ..HttpConfig::default()
        })
    }

    /// Underlying reqwest client. Clones share one connection pool.
    pub fn inner_client(&self) -> &Client {
        &self.client
    }

    fn transport_error(url: &str, error: &reqwest::Error) -> CacheError {
        CacheError::download(
            UrlUtils::obfuscate_credentials(url),
            error.status().map(|s| s.as_u16()),
            UrlUtils::obfuscate_credentials(&error.to_string()),
        )
    }

    /// Buffer the full body chunk by chunk, rejecting error statuses,
    /// transfers shorter or longer than the advertised `Content-Length`, and
    /// bodies over `max_body_bytes` as soon as the running total passes it.
    async fn read_full_body(
        mut response: Response,
        url: &str,
        max_body_bytes: Option<u64>,
    ) -> CacheResult<Bytes> {
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::download(
                UrlUtils::obfuscate_credentials(url),
                Some(status.as_u16()),
                format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let over_limit = |received: u64, limit: u64| {
            CacheError::download(
                UrlUtils::obfuscate_credentials(url),
                Some(status.as_u16()),
                format!("Response of {received} bytes exceeds limit of {limit} bytes"),
            )
        };

        let advertised = response.content_length();
        if let (Some(limit), Some(length)) = (max_body_bytes, advertised)
            && length > limit
        {
            return Err(over_limit(length, limit));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::transport_error(url, &e))?
        {
            let received = (body.len() + chunk.len()) as u64;
            if let Some(limit) = max_body_bytes
                && received > limit
            {
                return Err(over_limit(received, limit));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();
        let received = bytes.len() as u64;

        if let Some(expected) = advertised
            && expected != received
        {
            return Err(CacheError::download(
                UrlUtils::obfuscate_credentials(url),
                Some(status.as_u16()),
                format!("Truncated transfer: expected {expected} bytes, received {received}"),
            ));
        }

        Ok(bytes)
    }
}

#[async_trait]
impl HttpDownloader for StandardHttpClient {
    async fn download(&self, url: &str) -> CacheResult<Bytes> {
        debug!(url = %UrlUtils::obfuscate_credentials(url), "Downloading");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, &e))?;

        let bytes = Self::read_full_body(response, url, self.max_body_bytes).await?;

        debug!(
            url = %UrlUtils::obfuscate_credentials(url),
            bytes = bytes.len(),
            "Download complete"
        );
        Ok(bytes)
    }
}
