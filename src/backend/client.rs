use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::JobSource;
use crate::error::AppError;
use crate::models::job::JobListing;
use crate::models::relevance::{JobProcessingResult, RelevanceStatus, ToggleRequest};

const STRONG_MATCHES_PATH: &str = "/api/job-listings/relevance/strong";
const RELEVANCE_STATUS_PATH: &str = "/api/relevance/status";
const RELEVANCE_TOGGLE_PATH: &str = "/api/relevance/toggle";
const PROCESS_JOBS_PATH: &str = "/api/process_new_jobs_cron";

/// HTTP client for the scoring backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    /// Build a client with a bounded per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("relevance-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn relevance_status(&self) -> Result<RelevanceStatus, AppError> {
        let resp = self
            .client
            .get(self.url(RELEVANCE_STATUS_PATH))
            .send()
            .await?;
        read_json(resp).await
    }

    /// Override the backend's relevance schedule on or off.
    pub async fn toggle_relevance(&self, enabled: bool) -> Result<RelevanceStatus, AppError> {
        let resp = self
            .client
            .post(self.url(RELEVANCE_TOGGLE_PATH))
            .json(&ToggleRequest { enabled })
            .send()
            .await?;
        read_json(resp).await
    }

    /// Ask the backend to score the latest ingested jobs right now.
    pub async fn process_new_jobs(&self) -> Result<JobProcessingResult, AppError> {
        let resp = self.client.post(self.url(PROCESS_JOBS_PATH)).send().await?;
        read_json(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl JobSource for BackendClient {
    async fn fetch_strong_matches(&self) -> Result<Vec<JobListing>, AppError> {
        let resp = self
            .client
            .get(self.url(STRONG_MATCHES_PATH))
            .header("Accept", "application/json")
            .send()
            .await?;
        read_json(resp).await
    }
}

/// Check the status and decode the body. Failed responses carry the backend's
/// `detail` field when it sends one.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AppError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Request failed")
                )
            });
        return Err(AppError::Backend {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(resp.json::<T>().await?)
}
