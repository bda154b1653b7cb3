//! Validation settings.

use super::diagnostics::Severity;

/// Knobs for a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ValidationSettings {
    /// When off, passes report nothing.
    pub enabled: bool,
    /// Severity of unresolved root objects; `None` ignores them.
    pub undefined_object_severity: Option<Severity>,
    /// Severity of unknown namespaces; `None` ignores them.
    pub undefined_namespace_severity: Option<Severity>,
    /// Names never reported as unresolved. A trailing `*` matches a prefix.
    pub excluded_names: Vec<String>,
    /// How many supertype levels member lookup walks.
    pub max_supertype_depth: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            undefined_object_severity: Some(Severity::Error),
            undefined_namespace_severity: Some(Severity::Error),
            excluded_names: Vec::new(),
            max_supertype_depth: 16,
        }
    }
}

impl ValidationSettings {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_undefined_object_severity(mut self, severity: Option<Severity>) -> Self {
        self.undefined_object_severity = severity;
        self
    }

    pub fn with_undefined_namespace_severity(mut self, severity: Option<Severity>) -> Self {
        self.undefined_namespace_severity = severity;
        self
    }

    pub fn with_excluded_name(mut self, name: impl Into<String>) -> Self {
        self.excluded_names.push(name.into());
        self
    }

    pub fn with_max_supertype_depth(mut self, depth: usize) -> Self {
        self.max_supertype_depth = depth;
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_names
            .iter()
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => pattern == name,
            })
    }
}
