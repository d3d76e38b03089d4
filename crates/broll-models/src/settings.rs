//! Normalized render parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::request::Resolution;

/// The normalized parameter set for one render invocation.
///
/// All fields except `duration` must be present and nonzero before a
/// subprocess is spawned. There are no hidden defaults on the worker side: the registry
/// path requires the caller to supply resolution/samples/fps explicitly so
/// configuration stays centralized at the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate, Default)]
pub struct RenderSettings {
    /// Output resolution as `[width, height]`
    pub resolution: Option<Resolution>,

    /// Cycles sample count
    #[validate(range(min = 1))]
    pub samples: Option<u32>,

    /// Output frame rate
    #[validate(range(min = 1, max = 240))]
    pub fps: Option<u32>,

    /// Duration override in seconds; `None` or zero means the template's
    /// baked-in animation length
    pub duration: Option<u32>,
}

impl RenderSettings {
    /// Create settings with every field supplied.
    pub fn new(resolution: Resolution, samples: u32, fps: u32, duration: Option<u32>) -> Self {
        Self {
            resolution: Some(resolution),
            samples: Some(samples),
            fps: Some(fps),
            duration,
        }
    }

    /// Check that every required field is present and nonzero, returning
    /// the name of the first missing one otherwise.
    ///
    /// Zero counts as missing: a zero sample count, frame rate, or
    /// resolution dimension can never produce a frame, so it is reported
    /// like an absent field rather than handed to the renderer. The check
    /// order (resolution, samples, fps) matches the order the error
    /// messages are expected in.
    pub fn require_complete(&self) -> Result<(), &'static str> {
        match self.resolution {
            Some(r) if r.width() > 0 && r.height() > 0 => {}
            _ => return Err("resolution"),
        }
        if !matches!(self.samples, Some(s) if s > 0) {
            return Err("samples");
        }
        if !matches!(self.fps, Some(f) if f > 0) {
            return Err("fps");
        }
        Ok(())
    }

    /// Resolution, panicking if absent. Call `require_complete` first.
    pub fn resolution(&self) -> Resolution {
        self.resolution.expect("resolution checked by require_complete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_complete_names_first_missing_field() {
        let empty = RenderSettings::default();
        assert_eq!(empty.require_complete(), Err("resolution"));

        let no_samples = RenderSettings {
            resolution: Some(Resolution(1920, 1080)),
            ..Default::default()
        };
        assert_eq!(no_samples.require_complete(), Err("samples"));

        let no_fps = RenderSettings {
            resolution: Some(Resolution(1920, 1080)),
            samples: Some(128),
            ..Default::default()
        };
        assert_eq!(no_fps.require_complete(), Err("fps"));
    }

    #[test]
    fn test_zero_values_count_as_missing() {
        let zero_samples = RenderSettings::new(Resolution(1920, 1080), 0, 24, None);
        assert_eq!(zero_samples.require_complete(), Err("samples"));

        let zero_fps = RenderSettings::new(Resolution(1920, 1080), 128, 0, None);
        assert_eq!(zero_fps.require_complete(), Err("fps"));

        let zero_dim = RenderSettings::new(Resolution(0, 1080), 128, 24, None);
        assert_eq!(zero_dim.require_complete(), Err("resolution"));
    }

    #[test]
    fn test_complete_settings_pass() {
        let settings = RenderSettings::new(Resolution(1920, 1080), 128, 24, None);
        assert!(settings.require_complete().is_ok());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_bounds_validation() {
        let settings = RenderSettings {
            resolution: Some(Resolution(1920, 1080)),
            samples: Some(0),
            fps: Some(24),
            duration: None,
        };
        assert!(settings.validate().is_err());
    }
}
