//! Job output payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::Resolution;

/// Template field value used when the scene came from a URL download.
pub const TEMPLATE_FROM_URL: &str = "from_url";

/// Success payload returned for a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderOutput {
    /// Base64-encoded MP4 artifact
    pub video_base64: String,

    /// Registry template name, or `"from_url"` for downloaded scenes
    pub template: String,

    /// Source URL when the scene was downloaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_url: Option<String>,

    /// Duration override that was applied; `null` means the template's
    /// full animation was rendered
    pub duration: Option<u32>,

    /// Output resolution `[width, height]`
    pub resolution: Resolution,

    /// Wall-clock render time in seconds, rounded to 2 decimals
    pub render_time_seconds: f64,

    /// Size of the rendered artifact in bytes
    pub file_size_bytes: u64,

    /// Whether a GPU was detected before the render
    pub gpu_used: bool,
}

/// Failure payload returned for a failed job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailurePayload {
    /// Human-readable error description
    pub error: String,

    /// Wall-clock time spent before the failure, when the subprocess ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_time_seconds: Option<f64>,

    /// Tail of the renderer's stdout, when the subprocess ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl FailurePayload {
    /// Failure with no subprocess diagnostics.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            render_time_seconds: None,
            stdout: None,
        }
    }

    /// Attach elapsed time.
    pub fn with_render_time(mut self, seconds: f64) -> Self {
        self.render_time_seconds = Some(seconds);
        self
    }

    /// Attach a stdout tail, dropping empty strings.
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        if !stdout.is_empty() {
            self.stdout = Some(stdout);
        }
        self
    }
}

/// Terminal outcome of one worker invocation.
///
/// The worker entrypoint never raises past its own boundary; every failure
/// path is folded into `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Completed(Box<RenderOutput>),
    Failed(FailurePayload),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }

    /// The error message for failed outcomes.
    pub fn error(&self) -> Option<&str> {
        match self {
            JobOutcome::Completed(_) => None,
            JobOutcome::Failed(payload) => Some(&payload.error),
        }
    }
}
