//! Worker error types.

use thiserror::Error;

use broll_blender::RenderError;
use broll_models::FailurePayload;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Unknown template: {name}. Available: {available:?}")]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
    },

    #[error("Failed to download template: {0}")]
    DownloadFailed(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }
}

/// Fold any worker error into the structured failure payload returned to
/// the job system. Render failures keep their partial timing and stdout
/// excerpt for diagnostics.
impl From<WorkerError> for FailurePayload {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Render(render_err) => {
                let mut payload = FailurePayload::new(render_err.to_string());
                if let Some(seconds) = render_err.render_time_seconds() {
                    payload = payload.with_render_time(seconds);
                }
                if let Some(stdout) = render_err.stdout_tail() {
                    payload = payload.with_stdout(stdout);
                }
                payload
            }
            other => FailurePayload::new(other.to_string()),
        }
    }
}
