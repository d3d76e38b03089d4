//! Application state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};

use broll_models::{JobId, JobOutcome, JobRecord};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::handler::RenderHandler;

/// Shared application state.
///
/// The job table is in-memory only: queuing, retries, and multi-instance
/// scale-out belong to the platform hosting the worker, not to this
/// process. The single-permit semaphore serializes renders so at most one
/// subprocess runs per invocation.
#[derive(Clone)]
pub struct AppState {
    pub config: WorkerConfig,
    pub handler: Arc<RenderHandler>,
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
    pub render_permit: Arc<Semaphore>,
}

impl AppState {
    /// Create state with the production handler.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let handler = RenderHandler::from_config(&config)?;
        Ok(Self::with_handler(config, handler))
    }

    /// Create state with an injected handler (test seam).
    pub fn with_handler(config: WorkerConfig, handler: RenderHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            render_permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Record a freshly submitted job.
    pub async fn insert_job(&self, id: &JobId) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(id.to_string(), JobRecord::new(id.clone()));
    }

    /// Mark a job as running.
    pub async fn mark_running(&self, id: &JobId) {
        if let Some(record) = self.jobs.write().await.get_mut(id.as_str()) {
            record.start();
        }
    }

    /// Record a job's terminal outcome.
    pub async fn finish_job(&self, id: &JobId, outcome: JobOutcome, execution_time_ms: u64) {
        if let Some(record) = self.jobs.write().await.get_mut(id.as_str()) {
            record.finish(outcome, execution_time_ms);
        }
    }

    /// Look up a job record by id.
    pub async fn get_job(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }
}
