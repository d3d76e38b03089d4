//! Render worker library.
//!
//! One worker invocation processes exactly one job to completion: resolve
//! the scene template (registry name or URL download), probe for a GPU,
//! run the Blender subprocess, and shape the result into a success or
//! failure payload. The HTTP surface mirrors the serverless platform's
//! submit/poll contract (`/run`, `/runsync`, `/status/{id}`).

pub mod config;
pub mod download;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod state;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use handler::RenderHandler;
pub use registry::TemplateRegistry;
pub use routes::create_router;
pub use state::AppState;
