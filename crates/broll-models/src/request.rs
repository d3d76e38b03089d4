//! Render job requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::RenderSettings;

/// Output resolution on the wire: `[width, height]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Resolution(pub u32, pub u32);

impl Resolution {
    pub fn width(&self) -> u32 {
        self.0
    }

    pub fn height(&self) -> u32 {
        self.1
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.0, self.1)
    }
}

/// One render job request as submitted to the worker.
///
/// Exactly one of `template` / `template_url` should be set; `template`
/// takes precedence when both are present, and both absent falls back to
/// the registry's default entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Registry template name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// URL of a scene template to download at runtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_url: Option<String>,

    /// Duration override in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Output resolution `[width, height]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    /// Cycles sample count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u32>,

    /// Output frame rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,

    /// Template-specific configuration overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, Value>>,
}

impl RenderRequest {
    /// Merge the top-level parameters and the nested `config` map into the
    /// normalized settings struct.
    ///
    /// Entries in `config` override the top-level fields. Keys the worker
    /// does not understand, and values of the wrong shape, are ignored.
    pub fn merged_settings(&self) -> RenderSettings {
        let mut settings = RenderSettings {
            resolution: self.resolution,
            samples: self.samples,
            fps: self.fps,
            duration: self.duration,
        };

        if let Some(config) = &self.config {
            if let Some(v) = config.get("duration").and_then(as_u32) {
                settings.duration = Some(v);
            }
            if let Some(v) = config.get("resolution").and_then(as_resolution) {
                settings.resolution = Some(v);
            }
            if let Some(v) = config.get("samples").and_then(as_u32) {
                settings.samples = Some(v);
            }
            if let Some(v) = config.get("fps").and_then(as_u32) {
                settings.fps = Some(v);
            }
        }

        settings
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

fn as_resolution(value: &Value) -> Option<Resolution> {
    let arr = value.as_array()?;
    if arr.len() != 2 {
        return None;
    }
    Some(Resolution(as_u32(&arr[0])?, as_u32(&arr[1])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolution_wire_format() {
        let res: Resolution = serde_json::from_value(json!([1920, 1080])).unwrap();
        assert_eq!(res, Resolution(1920, 1080));
        assert_eq!(serde_json::to_value(res).unwrap(), json!([1920, 1080]));
    }

    #[test]
    fn test_request_deserialization() {
        let req: RenderRequest = serde_json::from_value(json!({
            "template": "ai_cpu_activation",
            "resolution": [1920, 1080],
            "samples": 128,
            "fps": 24
        }))
        .unwrap();

        assert_eq!(req.template.as_deref(), Some("ai_cpu_activation"));
        let settings = req.merged_settings();
        assert!(settings.require_complete().is_ok());
        assert_eq!(settings.samples, Some(128));
    }

    #[test]
    fn test_config_overrides_top_level() {
        let req: RenderRequest = serde_json::from_value(json!({
            "template": "ai_cpu_activation",
            "resolution": [1920, 1080],
            "samples": 128,
            "fps": 24,
            "config": {
                "samples": 64,
                "resolution": [1280, 720],
                "custom_knob": "ignored"
            }
        }))
        .unwrap();

        let settings = req.merged_settings();
        assert_eq!(settings.samples, Some(64));
        assert_eq!(settings.resolution, Some(Resolution(1280, 720)));
        assert_eq!(settings.fps, Some(24));
    }

    #[test]
    fn test_malformed_config_values_are_ignored() {
        let req: RenderRequest = serde_json::from_value(json!({
            "samples": 128,
            "config": {
                "samples": "lots",
                "resolution": [1920]
            }
        }))
        .unwrap();

        let settings = req.merged_settings();
        assert_eq!(settings.samples, Some(128));
        assert_eq!(settings.resolution, None);
    }
}
