//! Error types for render invocations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while invoking the renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Blender not found in PATH")]
    BlenderNotFound,

    #[error("xvfb-run not found in PATH")]
    XvfbNotFound,

    #[error("Template not found: {0}")]
    SceneNotFound(PathBuf),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("{message}")]
    RenderFailed {
        message: String,
        stdout_tail: Option<String>,
        render_time_seconds: f64,
    },

    #[error("Render timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create a render failure error.
    pub fn render_failed(
        message: impl Into<String>,
        stdout_tail: Option<String>,
        render_time_seconds: f64,
    ) -> Self {
        Self::RenderFailed {
            message: message.into(),
            stdout_tail,
            render_time_seconds,
        }
    }

    /// Elapsed wall-clock time, when the subprocess actually ran.
    pub fn render_time_seconds(&self) -> Option<f64> {
        match self {
            Self::RenderFailed {
                render_time_seconds,
                ..
            } => Some(*render_time_seconds),
            _ => None,
        }
    }

    /// Captured stdout tail, when the subprocess actually ran.
    pub fn stdout_tail(&self) -> Option<&str> {
        match self {
            Self::RenderFailed { stdout_tail, .. } => stdout_tail.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure was the hard timeout, as opposed to a general
    /// render failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
