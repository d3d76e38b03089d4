//! Endpoint client: submit, poll, persist.

use std::path::Path;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info};

use broll_models::{RenderRequest, StatusResponse, SubmitResponse};

use crate::error::{ClientError, ClientResult};

/// Terminal result of a poll loop.
#[derive(Debug)]
pub enum PollOutcome {
    /// Job reported COMPLETED
    Completed(StatusResponse),
    /// Job reported FAILED
    Failed(StatusResponse),
    /// Local ceiling elapsed first. The remote job is abandoned, not
    /// canceled; no cancellation protocol exists.
    TimedOut { elapsed: Duration },
}

/// HTTP client for one remote worker endpoint.
pub struct EndpointClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EndpointClient {
    /// Create a client for the given endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Submit one job. A non-2xx response is an error; no retry.
    pub async fn submit(&self, request: &RenderRequest) -> ClientResult<SubmitResponse> {
        let response = self
            .http
            .post(format!("{}/run", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "input": request }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the current status of a job.
    pub async fn status(&self, job_id: &str) -> ClientResult<StatusResponse> {
        let response = self
            .http
            .get(format!("{}/status/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Poll until the job reaches a terminal state or the local ceiling
    /// elapses. Polls first, then sleeps, so a job that is already
    /// terminal is observed without waiting an interval.
    pub async fn poll_until_terminal(
        &self,
        job_id: &str,
        interval: Duration,
        ceiling: Duration,
    ) -> ClientResult<PollOutcome> {
        let start = Instant::now();

        loop {
            let response = self.status(job_id).await?;
            let elapsed = start.elapsed();
            info!(
                "[{}s] Status: {}",
                elapsed.as_secs(),
                response.status
            );

            if response.status.is_terminal() {
                return Ok(if response.status == broll_models::JobStatus::Completed {
                    PollOutcome::Completed(response)
                } else {
                    PollOutcome::Failed(response)
                });
            }

            if elapsed > ceiling {
                return Ok(PollOutcome::TimedOut { elapsed });
            }

            tokio::time::sleep(interval).await;
        }
    }
}

/// Decode the base64 artifact and write it to `path` exactly once.
///
/// Returns the number of bytes written.
pub fn write_artifact(video_base64: &str, path: &Path) -> ClientResult<u64> {
    let bytes = BASE64.decode(video_base64)?;
    std::fs::write(path, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len() as u64)
}
