//! Worker entrypoint: one job request in, one structured payload out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use validator::Validate;

use broll_blender::gpu::{probe_gpu_with, DEFAULT_PROBE_TIMEOUT};
use broll_blender::{BlenderInvoker, RenderError};
use broll_models::{
    FailurePayload, JobOutcome, RenderOutput, RenderRequest, TEMPLATE_FROM_URL,
};

use crate::config::WorkerConfig;
use crate::download::{download_client, download_template};
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::registry::TemplateRegistry;

/// The resolved scene source for one job.
enum SceneSource {
    /// Registry entry: name plus bundled path
    Registry { name: String, path: PathBuf },
    /// Freshly downloaded file, owned by this invocation
    Downloaded { temp: TempPath },
}

impl SceneSource {
    fn path(&self) -> &Path {
        match self {
            SceneSource::Registry { path, .. } => path,
            SceneSource::Downloaded { temp, .. } => temp,
        }
    }

    fn template_label(&self) -> &str {
        match self {
            SceneSource::Registry { name, .. } => name,
            SceneSource::Downloaded { .. } => TEMPLATE_FROM_URL,
        }
    }
}

/// Processes render job requests.
///
/// The registry, invoker, and work directory are injected at construction
/// so tests can substitute fake templates and a synthetic renderer.
pub struct RenderHandler {
    registry: TemplateRegistry,
    invoker: BlenderInvoker,
    http: reqwest::Client,
    work_dir: PathBuf,
    gpu_probe_timeout: Duration,
}

impl RenderHandler {
    /// Build the production handler from config. Creates the work
    /// directory if it does not exist.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(&work_dir)?;

        let invoker = BlenderInvoker::new(&config.render_script)
            .with_program(&config.blender_program)
            .with_xvfb(config.use_xvfb)
            .with_timeout(config.render_timeout);

        Ok(Self {
            registry: TemplateRegistry::builtin(&config.template_dir),
            invoker,
            http: download_client(config.download_timeout)?,
            work_dir,
            gpu_probe_timeout: config.gpu_probe_timeout,
        })
    }

    /// Build a handler with an explicit registry and invoker (test seam).
    pub fn new(
        registry: TemplateRegistry,
        invoker: BlenderInvoker,
        http: reqwest::Client,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            invoker,
            http,
            work_dir: work_dir.into(),
            gpu_probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the GPU probe timeout.
    pub fn with_gpu_probe_timeout(mut self, timeout: Duration) -> Self {
        self.gpu_probe_timeout = timeout;
        self
    }

    /// Process one job request to a terminal outcome.
    ///
    /// Never returns an error and never panics past this boundary: every
    /// failure path folds into `JobOutcome::Failed` so the job system
    /// always receives a well-formed response. All temporary files are
    /// owned by this invocation and deleted on every exit path.
    pub async fn handle(&self, request: &RenderRequest) -> JobOutcome {
        // No hidden defaults for resolution/samples/fps: the registry path
        // requires them from the caller, and zero counts as missing.
        // Checked before any download or subprocess.
        let settings = request.merged_settings();
        if let Err(field) = settings.require_complete() {
            return self.fail(
                request,
                WorkerError::Render(RenderError::MissingParameter(field)).into(),
            );
        }
        if let Err(e) = settings.validate() {
            return self.fail(
                request,
                FailurePayload::new(format!("Invalid parameters: {e}")),
            );
        }

        let source = match self.resolve_scene(request).await {
            Ok(source) => source,
            Err(err) => return self.fail(request, err.into()),
        };

        let gpu_used = probe_gpu_with("nvidia-smi", self.gpu_probe_timeout).await;
        if !gpu_used {
            warn!("No GPU detected, render will be slow");
        }

        let output_path = match self.create_output_path() {
            Ok(path) => path,
            Err(err) => return self.fail(request, err.into()),
        };

        info!(
            "Starting render: template={} output={}",
            source.template_label(),
            output_path.display()
        );

        let report = match self
            .invoker
            .render(source.path(), &output_path, &settings)
            .await
        {
            Ok(report) => report,
            Err(err) => return self.fail(request, WorkerError::Render(err).into()),
        };

        let video_bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(request, WorkerError::Io(err).into()),
        };

        let template = source.template_label().to_string();
        metrics::record_job_completed(&template);
        metrics::record_render_duration(&template, report.render_time_seconds);

        let output = RenderOutput {
            video_base64: BASE64.encode(&video_bytes),
            template,
            template_url: request.template_url.clone(),
            duration: settings.duration,
            resolution: settings.resolution(),
            render_time_seconds: report.render_time_seconds,
            file_size_bytes: report.file_size_bytes,
            gpu_used,
        };

        // Drop already guarantees deletion on every path; closing
        // explicitly here surfaces (but never escalates) cleanup failures.
        if let Err(e) = output_path.close() {
            warn!("Failed to clean up output file: {}", e);
        }
        if let SceneSource::Downloaded { temp, .. } = source {
            match temp.close() {
                Ok(()) => debug!("Cleaned up downloaded template"),
                Err(e) => warn!("Failed to clean up downloaded template: {}", e),
            }
        }

        JobOutcome::Completed(Box::new(output))
    }

    /// Resolve the scene source with name-over-URL precedence; neither
    /// present falls back to the default registry entry.
    async fn resolve_scene(&self, request: &RenderRequest) -> WorkerResult<SceneSource> {
        if let Some(name) = &request.template {
            let path = self.registry.resolve(name)?.to_path_buf();
            info!("Template: {} -> {}", name, path.display());
            return Ok(SceneSource::Registry {
                name: name.clone(),
                path,
            });
        }

        if let Some(url) = &request.template_url {
            let temp = download_template(&self.http, url, &self.work_dir).await?;
            return Ok(SceneSource::Downloaded { temp });
        }

        let name = self.registry.default_name().to_string();
        let path = self.registry.resolve_default()?.to_path_buf();
        info!("Template: {} (default) -> {}", name, path.display());
        Ok(SceneSource::Registry { name, path })
    }

    /// Private invocation-scoped output path; deleted when the returned
    /// TempPath drops.
    fn create_output_path(&self) -> WorkerResult<TempPath> {
        let file = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile_in(&self.work_dir)?;
        Ok(file.into_temp_path())
    }

    fn fail(&self, request: &RenderRequest, payload: FailurePayload) -> JobOutcome {
        let template = request
            .template
            .as_deref()
            .unwrap_or_else(|| {
                if request.template_url.is_some() {
                    TEMPLATE_FROM_URL
                } else {
                    self.registry.default_name()
                }
            })
            .to_string();
        metrics::record_job_failed(&template);
        warn!("Job failed: {}", payload.error);
        JobOutcome::Failed(payload)
    }
}
