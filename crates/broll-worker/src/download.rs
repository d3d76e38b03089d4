//! Runtime template download.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tempfile::TempPath;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// User agent sent with template downloads.
pub const USER_AGENT: &str = concat!("broll-render/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for template downloads.
///
/// The timeout bounds the whole request, connect through body.
pub fn download_client(timeout: std::time::Duration) -> WorkerResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| WorkerError::download_failed(format!("client build error: {e}")))
}

/// Download a `.blend` template from a URL into an invocation-scoped temp
/// file inside `work_dir`.
///
/// The returned [`TempPath`] owns the file: it is deleted when dropped, on
/// every exit path of the invocation that requested the download. Any
/// failure here (non-2xx, network error, write error) is reported as a
/// descriptive job-level error, never a crash, and leaves no file behind.
pub async fn download_template(
    client: &reqwest::Client,
    url: &str,
    work_dir: &Path,
) -> WorkerResult<TempPath> {
    info!("Downloading template from: {}", url);
    let start = Instant::now();

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| WorkerError::download_failed(format!("request error: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WorkerError::download_failed(format!(
            "HTTP error downloading template: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown")
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| WorkerError::download_failed(format!("body read error: {e}")))?;

    // NamedTempFile deletes itself on drop, so an early return from any of
    // the writes below leaves nothing behind.
    let mut file = tempfile::Builder::new()
        .suffix(".blend")
        .tempfile_in(work_dir)
        .map_err(|e| WorkerError::download_failed(format!("temp file error: {e}")))?;
    file.write_all(&bytes)
        .and_then(|_| file.flush())
        .map_err(|e| WorkerError::download_failed(format!("write error: {e}")))?;

    let temp_path = file.into_temp_path();
    metrics::record_download_duration(start.elapsed().as_secs_f64());
    info!(
        "Downloaded template: {} bytes -> {}",
        bytes.len(),
        temp_path.display()
    );
    Ok(temp_path)
}
