//! Shared data models for the b-roll render service.
//!
//! This crate provides Serde-serializable types for:
//! - Render requests and normalized render settings
//! - Job status as observed through the submit/poll API
//! - Success and failure output payloads

pub mod job_status;
pub mod output;
pub mod request;
pub mod settings;

// Re-export common types
pub use job_status::{JobId, JobRecord, JobStatus, StatusResponse, SubmitResponse};
pub use output::{FailurePayload, JobOutcome, RenderOutput, TEMPLATE_FROM_URL};
pub use request::{RenderRequest, Resolution};
pub use settings::RenderSettings;
