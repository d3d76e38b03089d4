//! HTTP handlers for the job API.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};

use broll_models::{JobId, JobStatus, RenderRequest, StatusResponse, SubmitResponse};

use crate::state::AppState;

/// Submission body: `{ "input": { ... } }`, matching the platform's
/// envelope.
#[derive(Debug, Deserialize, Serialize)]
pub struct SubmitBody {
    pub input: RenderRequest,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Submit a job asynchronously: record it as queued, run it in the
/// background, and return the id immediately.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Json<SubmitResponse> {
    let id = JobId::new();
    state.insert_job(&id).await;
    info!(job_id = %id, "Received job");

    let task_state = state.clone();
    let task_id = id.clone();
    let span = tracing::info_span!("job", job_id = %id);
    tokio::spawn(
        async move {
            execute_job(&task_state, &task_id, &body.input).await;
        }
        .instrument(span),
    );

    Json(SubmitResponse {
        id,
        status: JobStatus::Queued,
    })
}

/// Execute a job inline and return its terminal status (the platform's
/// synchronous endpoint; also what local self-tests use).
pub async fn run_sync(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Json<StatusResponse> {
    let id = JobId::new();
    state.insert_job(&id).await;
    info!(job_id = %id, "Received job (sync)");

    let span = tracing::info_span!("job", job_id = %id);
    execute_job(&state, &id, &body.input)
        .instrument(span)
        .await;

    // The record is always present: nothing removes entries.
    match state.get_job(id.as_str()).await {
        Some(record) => Json(record.to_response()),
        None => Json(StatusResponse {
            id,
            status: JobStatus::Failed,
            output: None,
            error: Some("job record lost".to_string()),
            execution_time_ms: None,
        }),
    }
}

/// Poll a job's status by id.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.get_job(&id).await {
        Some(record) => Ok(Json(record.to_response())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                detail: format!("Unknown job: {id}"),
            }),
        )),
    }
}

/// Run one job to completion under the single-render permit.
async fn execute_job(state: &AppState, id: &JobId, request: &RenderRequest) {
    // One render subprocess per invocation; concurrent submissions queue
    // here rather than racing for the GPU.
    let _permit = state
        .render_permit
        .clone()
        .acquire_owned()
        .await
        .expect("render semaphore closed");

    state.mark_running(id).await;
    let start = Instant::now();
    let outcome = state.handler.handle(request).await;
    let execution_time_ms = start.elapsed().as_millis() as u64;

    info!(
        job_id = %id,
        success = outcome.is_success(),
        execution_time_ms,
        "Job finished"
    );
    state.finish_job(id, outcome, execution_time_ms).await;
}
