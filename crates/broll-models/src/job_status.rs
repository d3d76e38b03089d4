//! Job status types for the submit/poll API.
//!
//! Status names follow the serverless platform's wire format
//! (`SCREAMING_SNAKE_CASE`); transitions are only ever observed by polling.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::output::{FailurePayload, JobOutcome};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job accepted, waiting to run
    #[default]
    Queued,
    /// Job is actively rendering
    InProgress,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response to a job submission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitResponse {
    pub id: JobId,
    pub status: JobStatus,
}

/// Response to a status poll.
///
/// `output` is the success payload on `COMPLETED` and the auxiliary
/// diagnostic fields on `FAILED`; its exact shape belongs to the payload,
/// so it is carried as raw JSON here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

/// One job's state in the worker's in-memory table.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub outcome: Option<JobOutcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub execution_time_ms: Option<u64>,
}

impl JobRecord {
    /// Create a new queued record.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            outcome: None,
            created_at: now,
            updated_at: now,
            execution_time_ms: None,
        }
    }

    /// Mark the job as running.
    pub fn start(&mut self) {
        self.status = JobStatus::InProgress;
        self.updated_at = Utc::now();
    }

    /// Record a terminal outcome.
    pub fn finish(&mut self, outcome: JobOutcome, execution_time_ms: u64) {
        self.status = if outcome.is_success() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        self.outcome = Some(outcome);
        self.execution_time_ms = Some(execution_time_ms);
        self.updated_at = Utc::now();
    }

    /// Shape the record into a status response.
    pub fn to_response(&self) -> StatusResponse {
        let (output, error) = match &self.outcome {
            Some(JobOutcome::Completed(output)) => {
                (serde_json::to_value(output).ok(), None)
            }
            Some(JobOutcome::Failed(payload)) => (
                serde_json::to_value(payload).ok(),
                Some(payload.error.clone()),
            ),
            None => (None, None),
        };

        StatusResponse {
            id: self.id.clone(),
            status: self.status,
            output,
            error,
            execution_time_ms: self.execution_time_ms,
        }
    }
}

impl StatusResponse {
    /// The failure payload, when the job failed.
    pub fn failure(&self) -> Option<FailurePayload> {
        if self.status != JobStatus::Failed {
            return None;
        }
        self.output
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .or_else(|| self.error.clone().map(FailurePayload::new))
    }
}
