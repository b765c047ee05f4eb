//! Transcoding worker HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mezzo_models::{CallbackSecret, JobId, MediaId, MediaType};

use crate::error::{WorkerError, WorkerResult};

/// Configuration for the worker client.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the worker service
    pub base_url: String,
    /// Submit request timeout
    pub timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("WORKER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            timeout: Duration::from_secs(
                std::env::var("WORKER_SUBMIT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Job submission payload sent to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub media_id: MediaId,
    pub media_type: MediaType,
    /// Storage key of the raw upload
    pub input_key: String,
    /// Creator-scoped prefix for derived outputs
    pub output_prefix: String,
    /// Where the worker posts the completion callback
    pub webhook_url: String,
    /// Per-job secret the worker signs the callback with
    pub callback_secret: CallbackSecret,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Seam between the dispatcher and the worker service.
#[async_trait]
pub trait TranscodeWorker: Send + Sync {
    /// Submit a job and return the worker-assigned ID.
    async fn submit(&self, request: &SubmitRequest) -> WorkerResult<JobId>;
}

/// HTTP client for the worker service.
///
/// Submission is a single attempt on purpose: a failed dispatch leaves
/// the media item untouched and the caller surfaces the error, rather
/// than this layer retrying into a possibly half-accepted job.
pub struct HttpWorkerClient {
    http: Client,
    config: WorkerConfig,
}

impl HttpWorkerClient {
    /// Create a new worker client.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(WorkerError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::new(WorkerConfig::from_env())
    }
}

#[async_trait]
impl TranscodeWorker for HttpWorkerClient {
    async fn submit(&self, request: &SubmitRequest) -> WorkerResult<JobId> {
        let url = format!("{}/jobs", self.config.base_url);

        debug!(media_id = %request.media_id, "Submitting transcode job to {}", url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(WorkerError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = format!("Worker returned {}: {}", status, body);
            return Err(if status.is_server_error() {
                WorkerError::ServiceUnavailable(detail)
            } else {
                WorkerError::SubmitFailed(detail)
            });
        }

        let submitted: SubmitResponse = response.json().await?;
        if submitted.id.is_empty() {
            return Err(WorkerError::InvalidResponse(
                "Worker returned an empty job ID".to_string(),
            ));
        }

        Ok(JobId::from_string(submitted.id))
    }
}
