//! Client configuration.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default seconds between status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default local polling ceiling. Deliberately larger than the worker's
/// one-hour subprocess timeout so a worker-side timeout failure is
/// observed as FAILED here instead of the client giving up first.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 4500;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token for the endpoint
    pub api_key: String,
    /// Base URL of the worker endpoint
    pub endpoint_url: String,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Local wall-clock polling ceiling
    pub poll_timeout: Duration,
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// `BROLL_API_KEY` and `BROLL_ENDPOINT_URL` are required; their
    /// absence is a fatal configuration error at startup, not a retry.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("BROLL_API_KEY")
            .map_err(|_| ClientError::config("Set BROLL_API_KEY in environment or .env"))?;
        let endpoint_url = std::env::var("BROLL_ENDPOINT_URL")
            .map_err(|_| ClientError::config("Set BROLL_ENDPOINT_URL in environment or .env"))?;

        Ok(Self {
            api_key,
            endpoint_url,
            poll_interval: Duration::from_secs(
                std::env::var("BROLL_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            poll_timeout: Duration::from_secs(
                std::env::var("BROLL_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            ),
        })
    }
}
