//! Client job driver library.
//!
//! Submits one render job to a remote worker endpoint, polls the status
//! endpoint until a terminal state or a local wall-clock ceiling, and
//! materializes the decoded artifact to disk on success.

pub mod client;
pub mod config;
pub mod error;

pub use client::{write_artifact, EndpointClient, PollOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
