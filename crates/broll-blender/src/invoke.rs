//! Render invocation: spawn Blender, bound it with a timeout, classify the
//! outcome.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use broll_models::RenderSettings;

use crate::command::BlenderCommand;
use crate::error::{RenderError, RenderResult};
use crate::tail::{truncate_to_last_chars, TailBuffer};

/// Hard ceiling on a single render subprocess.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 3600;

/// Lines of stdout kept for diagnostics.
const STDOUT_TAIL_LINES: usize = 50;

/// Lines of stderr kept for diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// Character cap on the stdout excerpt carried in failure payloads.
const STDOUT_PAYLOAD_CHARS: usize = 2000;

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Wall-clock render time in seconds, rounded to 2 decimals
    pub render_time_seconds: f64,
    /// Size of the output artifact in bytes
    pub file_size_bytes: u64,
    /// Tail of the renderer's stdout
    pub stdout_tail: String,
}

/// Runs Blender renders as bounded subprocesses.
///
/// One invoker call maps to at most one subprocess; the caller blocks
/// (asynchronously) for the full render duration or the timeout,
/// whichever comes first.
#[derive(Debug, Clone)]
pub struct BlenderInvoker {
    /// Blender program to execute
    program: String,
    /// Scene-side render script loaded via `--python`
    script: PathBuf,
    /// Whether to wrap the command in `xvfb-run`
    use_xvfb: bool,
    /// Hard subprocess timeout
    timeout: Duration,
}

impl BlenderInvoker {
    /// Create an invoker with the given scene-side script.
    pub fn new(script: impl AsRef<Path>) -> Self {
        Self {
            program: "blender".to_string(),
            script: script.as_ref().to_path_buf(),
            use_xvfb: true,
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }

    /// Override the Blender program path (test seam).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Enable or disable the `xvfb-run` wrapper.
    pub fn with_xvfb(mut self, use_xvfb: bool) -> Self {
        self.use_xvfb = use_xvfb;
        self
    }

    /// Set the hard subprocess timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render `scene` to `output` with the given settings.
    ///
    /// Preconditions are checked before any subprocess is spawned: the
    /// scene file must exist and resolution/samples/fps must all be
    /// present. Success requires both a zero exit code and an output file
    /// on disk; a clean exit without output is still a failure.
    pub async fn render(
        &self,
        scene: &Path,
        output: &Path,
        settings: &RenderSettings,
    ) -> RenderResult<RenderReport> {
        if !scene.exists() {
            return Err(RenderError::SceneNotFound(scene.to_path_buf()));
        }
        settings
            .require_complete()
            .map_err(RenderError::MissingParameter)?;

        let resolution = settings.resolution();
        let cmd = BlenderCommand::new(scene, output, &self.script)
            .resolution(resolution.width(), resolution.height())
            .samples(settings.samples.unwrap_or_default())
            .fps(settings.fps.unwrap_or_default())
            .duration(settings.duration);

        let (program, args) = cmd.command_line(&self.program, self.use_xvfb);
        debug!("Executing: {} {}", program, args.join(" "));

        let start = Instant::now();
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().expect("stdout not captured");
        let stderr = child.stderr.take().expect("stderr not captured");
        let stdout_handle = spawn_tail_reader(stdout, STDOUT_TAIL_LINES);
        let stderr_handle = spawn_tail_reader(stderr, STDERR_TAIL_LINES);

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Render timed out after {} seconds, killing process",
                    self.timeout.as_secs()
                );
                let _ = child.kill().await;
                return Err(RenderError::Timeout(self.timeout.as_secs()));
            }
        };

        let render_time_seconds = round2(start.elapsed().as_secs_f64());
        let stdout_tail = stdout_handle.await.unwrap_or_default();
        let stderr_tail = stderr_handle.await.unwrap_or_default();

        if !stdout_tail.is_empty() {
            info!("Blender stdout tail:\n{}", stdout_tail);
        }
        if !stderr_tail.is_empty() {
            warn!("Blender stderr tail:\n{}", stderr_tail);
        }

        if status.success() && output.exists() {
            let file_size_bytes = tokio::fs::metadata(output).await?.len();
            info!(
                "Render complete in {:.2}s, {} bytes",
                render_time_seconds, file_size_bytes
            );
            Ok(RenderReport {
                render_time_seconds,
                file_size_bytes,
                stdout_tail: truncate_to_last_chars(&stdout_tail, STDOUT_PAYLOAD_CHARS)
                    .to_string(),
            })
        } else {
            let message = if stderr_tail.is_empty() {
                "Render failed - no output file".to_string()
            } else {
                stderr_tail
            };
            let stdout_excerpt = if stdout_tail.is_empty() {
                None
            } else {
                Some(truncate_to_last_chars(&stdout_tail, STDOUT_PAYLOAD_CHARS).to_string())
            };
            Err(RenderError::render_failed(
                message,
                stdout_excerpt,
                render_time_seconds,
            ))
        }
    }
}

/// Spawn a task that drains a pipe into a rolling tail buffer.
fn spawn_tail_reader<R>(reader: R, max_lines: usize) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail = TailBuffer::new(max_lines);
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tail.push(line);
        }
        tail.join()
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use broll_models::Resolution;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for the Blender binary.
    fn write_fake_renderer(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Script snippet that extracts the `--output` flag value into `$out`.
    const FIND_OUTPUT: &str = r#"out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"
done"#;

    fn complete_settings() -> RenderSettings {
        RenderSettings::new(Resolution(1920, 1080), 128, 24, None)
    }

    fn invoker(program: &Path, dir: &Path) -> BlenderInvoker {
        BlenderInvoker::new(dir.join("render_blend.py"))
            .with_program(program.to_string_lossy())
            .with_xvfb(false)
    }

    #[tokio::test]
    async fn test_missing_scene_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        // A nonexistent program would fail the spawn, so reaching
        // SceneNotFound proves no subprocess was attempted.
        let inv = BlenderInvoker::new("/nope/render_blend.py")
            .with_program("/nope/blender")
            .with_xvfb(false);
        let err = inv
            .render(
                &dir.path().join("missing.blend"),
                &dir.path().join("out.mp4"),
                &complete_settings(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::SceneNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_parameter_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();

        let settings = RenderSettings {
            resolution: Some(Resolution(1920, 1080)),
            samples: None,
            fps: Some(24),
            duration: None,
        };
        let inv = BlenderInvoker::new("/nope/render_blend.py")
            .with_program("/nope/blender")
            .with_xvfb(false);
        let err = inv
            .render(&scene, &dir.path().join("out.mp4"), &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingParameter("samples")));
    }

    #[tokio::test]
    async fn test_zero_samples_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();

        // The renderer drops a marker when executed; reaching
        // MissingParameter with no marker proves nothing was spawned.
        let marker = dir.path().join("ran.marker");
        let program = write_fake_renderer(
            dir.path(),
            "blender",
            &format!("touch {}", marker.display()),
        );

        let settings = RenderSettings::new(Resolution(1920, 1080), 0, 24, None);
        let err = invoker(&program, dir.path())
            .render(&scene, &dir.path().join("out.mp4"), &settings)
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::MissingParameter("samples")));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_successful_render_reports_size() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();
        let program = write_fake_renderer(
            dir.path(),
            "blender",
            &format!("{FIND_OUTPUT}\nprintf 'rendered' > \"$out\""),
        );

        let output = dir.path().join("out.mp4");
        let report = invoker(&program, dir.path())
            .render(&scene, &output, &complete_settings())
            .await
            .unwrap();

        assert_eq!(report.file_size_bytes, 8);
        assert!(output.exists());
        assert!(report.render_time_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_clean_exit_without_output_is_failure() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();
        let program = write_fake_renderer(dir.path(), "blender", "exit 0");

        let err = invoker(&program, dir.path())
            .render(&scene, &dir.path().join("out.mp4"), &complete_settings())
            .await
            .unwrap_err();

        match err {
            RenderError::RenderFailed { message, .. } => {
                assert_eq!(message, "Render failed - no output file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_carries_stderr_and_stdout_tails() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();
        let program = write_fake_renderer(
            dir.path(),
            "blender",
            "echo 'frame 1 of 200'\necho 'CUDA kernel compile failed' >&2\nexit 1",
        );

        let err = invoker(&program, dir.path())
            .render(&scene, &dir.path().join("out.mp4"), &complete_settings())
            .await
            .unwrap_err();

        match &err {
            RenderError::RenderFailed {
                message,
                stdout_tail,
                render_time_seconds,
            } => {
                assert!(message.contains("CUDA kernel compile failed"));
                assert_eq!(stdout_tail.as_deref(), Some("frame 1 of 200"));
                assert!(*render_time_seconds >= 0.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.render_time_seconds().is_some());
    }

    #[tokio::test]
    async fn test_timeout_is_classified_and_bounded() {
        let dir = TempDir::new().unwrap();
        let scene = dir.path().join("scene.blend");
        std::fs::write(&scene, b"blend").unwrap();
        let program = write_fake_renderer(dir.path(), "blender", "sleep 30");

        let start = Instant::now();
        let err = invoker(&program, dir.path())
            .with_timeout(Duration::from_secs(1))
            .render(&scene, &dir.path().join("out.mp4"), &complete_settings())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(err, RenderError::Timeout(1)));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
