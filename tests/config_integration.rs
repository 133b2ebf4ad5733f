//! Integration tests for configuration loading.

use pyscramble::config::{
    load_for_project, load_from_path, load_from_str, ConfigError, ObfuscateConfig,
    ValidationIssue, DEFAULT_CONFIG_FILE,
};
use std::error::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_full_config() {
    let toml = r#"
[scan]
extensions = ["py", "pyi"]
exclude = [".git", "third_party"]

[rename]
modules = false
docstrings = true
preserve = ["main", "setup"]
"#;

    let config = load_from_str(toml).unwrap();
    assert_eq!(config.scan.extensions, ["py", "pyi"]);
    assert_eq!(config.scan.exclude, [".git", "third_party"]);
    assert!(!config.rename.modules);
    assert!(config.rename.docstrings);
    assert_eq!(config.rename.preserve, ["main", "setup"]);
}

#[test]
fn test_missing_sections_use_defaults() {
    let config = load_from_str("[rename]\npreserve = [\"main\"]\n").unwrap();
    assert_eq!(config.scan, ObfuscateConfig::default().scan);
    assert!(config.rename.modules);
    assert_eq!(config.rename.preserve, ["main"]);

    assert_eq!(load_from_str("").unwrap(), ObfuscateConfig::default());
}

#[test]
fn test_unknown_keys_are_rejected() {
    let result = load_from_str("[rename]\nmodule = false\n");
    assert!(matches!(result, Err(ConfigError::Toml { path: None, .. })));
}

#[test]
fn test_validation_reports_every_issue() {
    let toml = r#"
[scan]
extensions = [".py"]

[rename]
preserve = ["fine", "not fine"]
"#;

    match load_from_str(toml) {
        Err(ConfigError::Validation { source, .. }) => {
            assert_eq!(
                source.issues,
                vec![
                    ValidationIssue::InvalidExtension {
                        extension: ".py".into()
                    },
                    ValidationIssue::InvalidPreservedName {
                        name: "not fine".into()
                    },
                ]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_errors_from_files_carry_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[scan]\nextensions = []\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("bad.toml"));
    assert!(err.to_string().contains("scan.extensions must not be empty"));
    assert!(err.source().is_some());

    let missing = load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }));
}

#[test]
fn test_project_config_discovery() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        load_for_project(dir.path(), None).unwrap(),
        ObfuscateConfig::default()
    );

    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        "[rename]\ndocstrings = false\n",
    )
    .unwrap();
    assert!(!load_for_project(dir.path(), None).unwrap().rename.docstrings);

    let explicit = dir.path().join("other.toml");
    fs::write(&explicit, "[rename]\nmodules = false\n").unwrap();
    let config = load_for_project(dir.path(), Some(&explicit)).unwrap();
    assert!(!config.rename.modules);
    assert!(config.rename.docstrings);
}
