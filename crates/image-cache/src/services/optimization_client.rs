//! HTTP client for the external optimization service
//!
//! Protocol:
//! - `POST {endpoint}/v1/jobs?name={image_name}` with the image as the body
//!   and `X-Optimize-Lossy` / `X-Optimize-Quality` headers, answered by
//!   `{"id": "..."}`
//! - `GET {endpoint}/v1/jobs/{id}` answered by
//!   `{"status": "pending" | "running" | "succeeded" | "failed", "result_url": ..., "error": ...}`

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::traits::{OptimizationOptions, OptimizationService, ServiceOutcome};
use crate::config::{HttpConfig, OptimizerConfig};
use crate::errors::{CacheError, CacheResult};
use crate::utils::{StandardHttpClient, UrlUtils};

const SERVICE_NAME: &str = "optimizer";
const API_KEY_HEADER: &str = "X-Api-Key";
const LOSSY_HEADER: &str = "X-Optimize-Lossy";
const QUALITY_HEADER: &str = "X-Optimize-Quality";

#[derive(Debug, Deserialize)]
struct JobSubmitted {
    id: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: JobState,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Submit-and-poll client for the optimization service
#[derive(Clone)]
pub struct HttpOptimizationService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl HttpOptimizationService {
    /// Client with its own connection pool built from the `[http]` section
    pub fn new(config: &OptimizerConfig, http: &HttpConfig) -> CacheResult<Self> {
        let client = StandardHttpClient::new(http)?.inner_client().clone();
        Self::with_client(config, client)
    }

    /// Client reusing an existing reqwest client and its connection pool
    pub fn with_client(config: &OptimizerConfig, client: Client) -> CacheResult<Self> {
        Url::parse(&config.endpoint).map_err(|e| {
            CacheError::configuration(format!(
                "Invalid optimizer endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts.max(1),
        })
    }

    fn url(&self, path: &str) -> CacheResult<Url> {
        UrlUtils::join(&self.endpoint, path)
            .map_err(|e| CacheError::external_service(SERVICE_NAME, format!("Invalid URL: {e}")))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn submit(&self, bytes: Bytes, name: &str, options: &OptimizationOptions) -> CacheResult<String> {
        let mut url = self.url("v1/jobs")?;
        url.query_pairs_mut().append_pair("name", name);

        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(LOSSY_HEADER, options.lossy.to_string())
            .header(QUALITY_HEADER, options.quality.to_string())
            .body(bytes);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(Self::transport_error)?;
        let submitted: JobSubmitted = Self::parse_json(response).await?;

        debug!(image_name = name, job_id = %submitted.id, "Optimization job submitted");
        Ok(submitted.id)
    }

    async fn poll(&self, job_id: &str) -> CacheResult<JobStatus> {
        let url = self.url(&format!("v1/jobs/{job_id}"))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> CacheResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::external_service(
                SERVICE_NAME,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }
        response.json::<T>().await.map_err(|e| {
            CacheError::external_service(SERVICE_NAME, format!("Unexpected response: {e}"))
        })
    }

    fn transport_error(error: reqwest::Error) -> CacheError {
        CacheError::external_service(
            SERVICE_NAME,
            UrlUtils::obfuscate_credentials(&error.to_string()),
        )
    }
}

#[async_trait]
impl OptimizationService for HttpOptimizationService {
    async fn process(
        &self,
        bytes: Bytes,
        name: &str,
        options: &OptimizationOptions,
    ) -> CacheResult<ServiceOutcome> {
        let job_id = self.submit(bytes, name, options).await?;

        for attempt in 1..=self.max_poll_attempts {
            let status = self.poll(&job_id).await?;
            match status.status {
                JobState::Succeeded => {
                    return Ok(match status.result_url {
                        Some(result_url) => ServiceOutcome::Succeeded { result_url },
                        None => ServiceOutcome::Failed {
                            detail: format!("job {job_id} succeeded without a result URL"),
                        },
                    });
                }
                JobState::Failed => {
                    return Ok(ServiceOutcome::Failed {
                        detail: status
                            .error
                            .unwrap_or_else(|| format!("job {job_id} failed without detail")),
                    });
                }
                JobState::Pending | JobState::Running => {
                    debug!(job_id = %job_id, attempt, state = ?status.status, "Optimization job not finished");
                    if attempt < self.max_poll_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        warn!(job_id = %job_id, attempts = self.max_poll_attempts, "Optimization job timed out");
        Ok(ServiceOutcome::Failed {
            detail: format!(
                "job {job_id} did not finish after {} status checks",
                self.max_poll_attempts
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_parsing() {
        let status: JobStatus = serde_json::from_str(
            r#"{"status": "succeeded", "result_url": "https://optimizer/r/1"}"#,
        )
        .expect("valid status");
        assert_eq!(status.status, JobState::Succeeded);
        assert_eq!(status.result_url.as_deref(), Some("https://optimizer/r/1"));

        let status: JobStatus =
            serde_json::from_str(r#"{"status": "failed", "error": "bad input"}"#).expect("valid status");
        assert_eq!(status.status, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("bad input"));

        assert!(serde_json::from_str::<JobStatus>(r#"{"status": "exploded"}"#).is_err());
    }

    #[test]
    fn test_invalid_endpoint_is_configuration_error() {
        let config = OptimizerConfig {
            endpoint: "not a url".to_string(),
            ..OptimizerConfig::default()
        };
        let result = HttpOptimizationService::new(&config, &HttpConfig::default());
        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }
}
