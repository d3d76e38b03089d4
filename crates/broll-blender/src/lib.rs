//! Blender subprocess wrapper.
//!
//! This crate turns a resolved scene file plus a normalized parameter set
//! into a rendered video artifact by shelling out to Blender under a
//! virtual display. Rendering semantics live entirely inside Blender and
//! the scene-side script it loads; this crate only builds command lines,
//! enforces timeouts, and classifies outcomes.

pub mod command;
pub mod error;
pub mod gpu;
pub mod invoke;
pub mod tail;

pub use command::{check_blender, check_xvfb, BlenderCommand};
pub use error::{RenderError, RenderResult};
pub use gpu::{probe_gpu, probe_gpu_with};
pub use invoke::{BlenderInvoker, RenderReport};
