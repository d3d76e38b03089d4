//! Template registry: the fixed name-to-path table of bundled scene
//! templates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{WorkerError, WorkerResult};

/// Name of the registry entry used when a request names no template.
pub const DEFAULT_TEMPLATE: &str = "ai_cpu_activation";

/// Read-only mapping from template names to bundled `.blend` paths.
///
/// The mapping is injected into the worker at construction so tests can
/// substitute fake paths; `builtin` provides the production table.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, PathBuf>,
    default_name: String,
}

impl TemplateRegistry {
    /// Create a registry from an explicit mapping and default entry.
    pub fn new(
        templates: impl IntoIterator<Item = (String, PathBuf)>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            templates: templates.into_iter().collect(),
            default_name: default_name.into(),
        }
    }

    /// The registry of templates bundled into the worker image.
    pub fn builtin(template_dir: impl AsRef<Path>) -> Self {
        let dir = template_dir.as_ref();
        Self::new(
            [(
                DEFAULT_TEMPLATE.to_string(),
                dir.join("ai_cpu_activation_branded.blend"),
            )],
            DEFAULT_TEMPLATE,
        )
    }

    /// Resolve a template name to its scene path.
    ///
    /// Unknown names fail with the list of valid names; no download or
    /// subprocess is ever attempted for them.
    pub fn resolve(&self, name: &str) -> WorkerResult<&Path> {
        self.templates
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| WorkerError::UnknownTemplate {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// The default entry's name.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Resolve the default entry.
    pub fn resolve_default(&self) -> WorkerResult<&Path> {
        self.resolve(&self.default_name)
    }

    /// Sorted template names.
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = TemplateRegistry::builtin("/workspace/templates");
        let path = registry.resolve("ai_cpu_activation").unwrap();
        assert_eq!(
            path,
            Path::new("/workspace/templates/ai_cpu_activation_branded.blend")
        );
        assert_eq!(registry.default_name(), "ai_cpu_activation");
    }

    #[test]
    fn test_unknown_name_lists_valid_names() {
        let registry = TemplateRegistry::builtin("/workspace/templates");
        let err = registry.resolve("neural_network").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("neural_network"));
        assert!(msg.contains("ai_cpu_activation"));
    }

    #[test]
    fn test_injected_mapping() {
        let registry = TemplateRegistry::new(
            [
                ("b".to_string(), PathBuf::from("/fake/b.blend")),
                ("a".to_string(), PathBuf::from("/fake/a.blend")),
            ],
            "a",
        );
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.resolve_default().unwrap(), Path::new("/fake/a.blend"));
    }
}
