//! Prometheus metrics for the render worker.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "broll_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "broll_jobs_failed_total";
    pub const RENDER_DURATION_SECONDS: &str = "broll_render_duration_seconds";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "broll_download_duration_seconds";
}

/// Record job completed.
pub fn record_job_completed(template: &str) {
    let labels = [("template", template.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record job failed.
pub fn record_job_failed(template: &str) {
    let labels = [("template", template.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record render subprocess duration.
pub fn record_render_duration(template: &str, duration_secs: f64) {
    let labels = [("template", template.to_string())];
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record template download duration.
pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}
