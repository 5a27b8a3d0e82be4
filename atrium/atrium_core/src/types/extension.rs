//! Extension descriptor type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ExtensionError;

/// Declarative record naming a cross-cutting capability to install into an
/// application at boot.
///
/// A descriptor must carry a unique `name` and exactly one source: either
/// `module` (a resolvable package name) or `file` (a filesystem path to an
/// extension manifest). Violating either rule is a configuration error
/// raised at registration time, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Registry key; unique within one extension registry
    pub name: String,

    /// Resolvable package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Filesystem path to an extension manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ExtensionDescriptor {
    /// Descriptor sourced from a named package.
    pub fn from_module(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: Some(module.into()),
            file: None,
        }
    }

    /// Descriptor sourced from a manifest file.
    pub fn from_file(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            module: None,
            file: Some(file.into()),
        }
    }

    /// Validate descriptor shape. Performs no I/O.
    pub fn validate(&self) -> Result<(), ExtensionError> {
        if self.name.is_empty() {
            return Err(ExtensionError::MissingName);
        }
        match (&self.module, &self.file) {
            (None, None) => Err(ExtensionError::NoSource(self.name.clone())),
            (Some(_), Some(_)) => Err(ExtensionError::AmbiguousSource(self.name.clone())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_one_source() {
        assert!(ExtensionDescriptor::from_module("a", "pkg").validate().is_ok());
        assert!(ExtensionDescriptor::from_file("b", "/ext/b.json")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_missing_name() {
        let descriptor = ExtensionDescriptor::from_module("", "pkg");
        assert!(matches!(
            descriptor.validate(),
            Err(ExtensionError::MissingName)
        ));
    }

    #[test]
    fn rejects_missing_source() {
        let descriptor = ExtensionDescriptor {
            name: "a".to_string(),
            module: None,
            file: None,
        };
        assert!(matches!(
            descriptor.validate(),
            Err(ExtensionError::NoSource(_))
        ));
    }

    #[test]
    fn rejects_both_sources() {
        let descriptor = ExtensionDescriptor {
            name: "a".to_string(),
            module: Some("pkg".to_string()),
            file: Some(PathBuf::from("/ext/a.json")),
        };
        assert!(matches!(
            descriptor.validate(),
            Err(ExtensionError::AmbiguousSource(_))
        ));
    }

    #[test]
    fn deserializes_from_config_shape() {
        let descriptor: ExtensionDescriptor =
            serde_json::from_str(r#"{"name": "my-extension-1", "module": "my-module-name-1"}"#)
                .unwrap();
        assert_eq!(descriptor.name, "my-extension-1");
        assert_eq!(descriptor.module.as_deref(), Some("my-module-name-1"));
        assert!(descriptor.file.is_none());
    }
}
