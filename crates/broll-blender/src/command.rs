//! Blender command builder.

use std::path::{Path, PathBuf};

use crate::error::{RenderError, RenderResult};

/// Default `xvfb-run` server arguments. Blender's GPU initialization needs
/// a display context even though the render is headless.
pub const XVFB_SERVER_ARGS: &str = "-screen 0 1920x1080x24";

/// Builder for a Blender render command.
///
/// Produces `blender --background <scene> --python <script> -- --output
/// <path> --width <w> --height <h> --samples <s> --fps <f> [--duration
/// <d>]`, optionally wrapped in `xvfb-run`. Everything after the `--` is
/// the CLI contract of the scene-side script that Blender loads and
/// executes in-process.
#[derive(Debug, Clone)]
pub struct BlenderCommand {
    /// Scene template (.blend) to load
    scene: PathBuf,
    /// Output artifact path
    output: PathBuf,
    /// Scene-side render script
    script: PathBuf,
    width: u32,
    height: u32,
    samples: u32,
    fps: u32,
    duration: Option<u32>,
}

impl BlenderCommand {
    /// Create a new render command.
    pub fn new(
        scene: impl AsRef<Path>,
        output: impl AsRef<Path>,
        script: impl AsRef<Path>,
    ) -> Self {
        Self {
            scene: scene.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            script: script.as_ref().to_path_buf(),
            width: 0,
            height: 0,
            samples: 0,
            fps: 0,
            duration: None,
        }
    }

    /// Set the output resolution.
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the sample count.
    pub fn samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Set the frame rate.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the duration override. `None` or zero renders the template's
    /// full animation.
    pub fn duration(mut self, duration: Option<u32>) -> Self {
        self.duration = duration;
        self
    }

    /// Scene template path.
    pub fn scene(&self) -> &Path {
        &self.scene
    }

    /// Output artifact path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the argument list passed to the Blender binary.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--background".to_string(),
            self.scene.to_string_lossy().to_string(),
            "--python".to_string(),
            self.script.to_string_lossy().to_string(),
            "--".to_string(),
            "--output".to_string(),
            self.output.to_string_lossy().to_string(),
            "--width".to_string(),
            self.width.to_string(),
            "--height".to_string(),
            self.height.to_string(),
            "--samples".to_string(),
            self.samples.to_string(),
            "--fps".to_string(),
            self.fps.to_string(),
        ];

        // Only forwarded when set and nonzero; the script otherwise uses
        // the scene's own animation range.
        if let Some(duration) = self.duration.filter(|&d| d > 0) {
            args.push("--duration".to_string());
            args.push(duration.to_string());
        }

        args
    }

    /// Resolve the program and full argument list, wrapping in `xvfb-run`
    /// when requested.
    pub fn command_line(&self, program: &str, use_xvfb: bool) -> (String, Vec<String>) {
        let args = self.build_args();
        if use_xvfb {
            let mut wrapped = vec![
                "-a".to_string(),
                format!("--server-args={}", XVFB_SERVER_ARGS),
                program.to_string(),
            ];
            wrapped.extend(args);
            ("xvfb-run".to_string(), wrapped)
        } else {
            (program.to_string(), args)
        }
    }
}

/// Check if Blender is available.
pub fn check_blender() -> RenderResult<PathBuf> {
    which::which("blender").map_err(|_| RenderError::BlenderNotFound)
}

/// Check if xvfb-run is available.
pub fn check_xvfb() -> RenderResult<PathBuf> {
    which::which("xvfb-run").map_err(|_| RenderError::XvfbNotFound)
}
