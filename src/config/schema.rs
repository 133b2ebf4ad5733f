use crate::ts::python::is_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contents of `pyscramble.toml`. Every section and key is optional.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ObfuscateConfig {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub rename: RenameSettings,
}

/// Which files belong to the project.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// File extensions (without the dot) treated as Python sources
    pub extensions: Vec<String>,
    /// Directory names never descended into
    pub exclude: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            exclude: [".git", "__pycache__", ".venv", "venv", "build", "dist"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RenameSettings {
    /// Rename each module file after its bindings
    pub modules: bool,
    /// Strip docstrings after renaming bindings
    pub docstrings: bool,
    /// Names that are never renamed and never issued
    pub preserve: Vec<String>,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            modules: true,
            docstrings: true,
            preserve: Vec::new(),
        }
    }
}

impl ObfuscateConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.scan.extensions.is_empty() {
            issues.push(ValidationIssue::NoExtensions);
        }
        for extension in &self.scan.extensions {
            if extension.trim().is_empty() || extension.starts_with('.') {
                issues.push(ValidationIssue::InvalidExtension {
                    extension: extension.clone(),
                });
            }
        }
        for name in &self.rename.preserve {
            if !is_identifier(name) {
                issues.push(ValidationIssue::InvalidPreservedName { name: name.clone() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoExtensions,
    InvalidExtension { extension: String },
    InvalidPreservedName { name: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoExtensions => write!(f, "scan.extensions must not be empty"),
            ValidationIssue::InvalidExtension { extension } => write!(
                f,
                "scan.extensions entry '{extension}' must be a bare extension such as \"py\""
            ),
            ValidationIssue::InvalidPreservedName { name } => {
                write!(f, "rename.preserve entry '{name}' is not a Python identifier")
            }
        }
    }
}
