//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Work directory for invocation-scoped temporary files
    pub work_dir: String,
    /// Directory holding the bundled scene templates
    pub template_dir: String,
    /// Scene-side render script loaded by Blender
    pub render_script: String,
    /// Blender program to execute
    pub blender_program: String,
    /// Whether to wrap renders in xvfb-run
    pub use_xvfb: bool,
    /// Hard render subprocess timeout
    pub render_timeout: Duration,
    /// Template download timeout
    pub download_timeout: Duration,
    /// GPU probe (`nvidia-smi`) timeout
    pub gpu_probe_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Whether the Prometheus endpoint is exposed
    pub metrics_enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            work_dir: "/tmp/broll".to_string(),
            template_dir: "/workspace/templates".to_string(),
            render_script: "/workspace/render_blend.py".to_string(),
            blender_program: "blender".to_string(),
            use_xvfb: true,
            render_timeout: Duration::from_secs(3600), // 1 hour
            download_timeout: Duration::from_secs(120),
            gpu_probe_timeout: Duration::from_secs(10),
            max_body_size: 10 * 1024 * 1024, // 10MB
            metrics_enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("WORKER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("WORKER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/broll".to_string()),
            template_dir: std::env::var("TEMPLATE_DIR")
                .unwrap_or_else(|_| "/workspace/templates".to_string()),
            render_script: std::env::var("RENDER_SCRIPT")
                .unwrap_or_else(|_| "/workspace/render_blend.py".to_string()),
            blender_program: std::env::var("BLENDER_PROGRAM")
                .unwrap_or_else(|_| "blender".to_string()),
            use_xvfb: std::env::var("USE_XVFB")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            render_timeout: Duration::from_secs(
                std::env::var("RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            gpu_probe_timeout: Duration::from_secs(
                std::env::var("GPU_PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}
