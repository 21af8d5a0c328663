//! Backend HTTP client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info};

use clip_models::{Job, JobId, JobOutcome};

use crate::backend::JobBackend;
use crate::error::{BackendError, BackendResult};
use crate::types::{parse_claim_response, ProgressRequest};

/// Header carrying the worker identity.
pub const WORKER_ID_HEADER: &str = "x-worker-id";

/// Configuration for the backend client.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, without trailing slash
    pub base_url: String,
    /// Bearer token identifying this worker
    pub token: String,
    /// Worker identity sent with every request
    pub worker_id: String,
    /// Request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            worker_id: worker_id.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("worker_id", &self.worker_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the backend internal job API.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        if config.base_url.is_empty() {
            return Err(BackendError::config("backend base URL is empty"));
        }
        if config.token.is_empty() {
            return Err(BackendError::config("worker token is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("clip-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            base_url = %config.base_url,
            worker_id = %config.worker_id,
            "Created backend client"
        );

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/internal/jobs/{}", self.config.base_url, path)
    }

    fn job_url(&self, job_id: &JobId, action: &str) -> BackendResult<String> {
        if job_id.is_empty() {
            return Err(BackendError::EmptyJobId);
        }
        Ok(self.url(&format!(
            "{}/{}",
            urlencoding::encode(job_id.as_str()),
            action
        )))
    }

    /// POST with auth, identity and content-type headers attached.
    fn post(&self, url: &str) -> RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.config.token)
            .header(WORKER_ID_HEADER, &self.config.worker_id)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// Map a non-2xx response of a best-effort call.
    async fn ensure_success(endpoint: &str, response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn send_outcome(&self, job_id: &JobId, outcome: &JobOutcome) -> BackendResult<()> {
        let url = self.job_url(job_id, "complete")?;

        debug!(job_id = %job_id, status = outcome.status_str(), "Reporting job outcome");

        let response = self.post(&url).json(outcome).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Report {
                job_id: job_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl JobBackend for BackendClient {
    async fn claim_next(&self) -> BackendResult<Option<Job>> {
        let url = self.url("claim");
        debug!("Claiming next job from {}", url);

        let response = self.post(&url).send().await?;
        let response = Self::ensure_success("claim", response).await?;
        let body = response.text().await?;

        let job = parse_claim_response(&body)?;
        match &job {
            Some(job) => debug!(job_id = %job.id, job_type = %job.job_type, "Job claimed"),
            None => debug!("No job available"),
        }

        Ok(job)
    }

    async fn report_heartbeat(&self, job_id: &JobId) -> BackendResult<()> {
        let url = self.job_url(job_id, "heartbeat")?;
        let response = self.post(&url).send().await?;
        Self::ensure_success("heartbeat", response).await?;
        Ok(())
    }

    async fn report_progress(&self, job_id: &JobId, percent: u8) -> BackendResult<()> {
        let url = self.job_url(job_id, "progress")?;
        let body = ProgressRequest {
            progress: percent.min(100),
        };
        let response = self.post(&url).json(&body).send().await?;
        Self::ensure_success("progress", response).await?;
        Ok(())
    }

    async fn report_complete(
        &self,
        job_id: &JobId,
        result: &serde_json::Value,
    ) -> BackendResult<()> {
        self.send_outcome(job_id, &JobOutcome::completed(result.clone()))
            .await
    }

    async fn report_failed(&self, job_id: &JobId, cause: &str) -> BackendResult<()> {
        self.send_outcome(job_id, &JobOutcome::failed(cause)).await
    }
}
