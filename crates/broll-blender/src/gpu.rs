//! GPU availability probe.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe for an NVIDIA GPU via `nvidia-smi`.
///
/// This is a non-fatal diagnostic: the result only annotates the job
/// response and a warning log. Blender does its own backend selection
/// internally and renders on CPU when no GPU is usable, so a `false` here
/// never blocks the render attempt.
pub async fn probe_gpu() -> bool {
    probe_gpu_with("nvidia-smi", DEFAULT_PROBE_TIMEOUT).await
}

/// Probe with an explicit program and timeout (test seam).
pub async fn probe_gpu_with(program: &str, timeout: Duration) -> bool {
    let output = Command::new(program)
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match tokio::time::timeout(timeout, output).await {
        Ok(Ok(out)) if out.status.success() => {
            let names = String::from_utf8_lossy(&out.stdout);
            info!("GPU detected: {}", names.trim());
            true
        }
        Ok(Ok(out)) => {
            debug!("GPU probe exited with {:?}", out.status.code());
            false
        }
        Ok(Err(e)) => {
            debug!("GPU probe failed: {}", e);
            false
        }
        Err(_) => {
            debug!("GPU probe timed out after {:?}", timeout);
            false
        }
    }
}
