//! Whole-project runs: cross-file renames, docstrings and module moves.

use super::{bindings_only, obfuscate_with, project_with, read};
use pyscramble::config::ScanSettings;
use pyscramble::driver::{FileState, ObfuscateOptions, Obfuscator};
use pyscramble::names::NameAllocator;
use pyscramble::rename::{LexicalRenamer, Project};
use pyscramble::ts::validate_syntax;
use std::collections::HashSet;
use std::path::Path;

const APP: &str = r#"from geometry import area


def main():
    width = 3
    return area(width, width)
"#;

const GEOMETRY: &str = r#""""Shapes."""


def area(width, height):
    """Area of a rectangle."""
    return width * height
"#;

#[test]
fn renames_follow_references_across_files() {
    let dir = project_with(&[("app.py", APP), ("geometry.py", GEOMETRY)]);
    let report = obfuscate_with(
        dir.path(),
        &LexicalRenamer::default(),
        ObfuscateOptions::default(),
    );

    assert_eq!(
        read(dir.path(), "c.py"),
        "from f import e\n\n\ndef b():\n    a = 3\n    return e(a, a)\n"
    );
    assert_eq!(read(dir.path(), "f.py"), "\n\ndef e(a, d):\n    return a * d\n");
    assert!(!dir.path().join("app.py").exists());
    assert!(!dir.path().join("geometry.py").exists());

    for file in ["c.py", "f.py"] {
        assert!(validate_syntax(&read(dir.path(), file)).is_ok());
    }

    let geometry = &report.files[1];
    assert_eq!(geometry.state, FileState::Done);
    assert_eq!(geometry.docstrings_removed, 2);
    assert_eq!(geometry.renamed_to.as_deref(), Some(Path::new("f.py")));
    // `width` was already renamed from app.py when geometry.py was streamed.
    assert_eq!(geometry.skips.len(), 1);
    assert_eq!(geometry.skips[0].name, "a");
}

#[test]
fn issued_names_are_unique_across_the_run() {
    let dir = project_with(&[
        ("pkg/__init__.py", "from .core import run\n"),
        (
            "pkg/core.py",
            "def run(count):\n    total = 0\n    for step in range(count):\n        total += step\n    return total\n",
        ),
        ("tool.py", "import pkg\n\n\ndef launch(count):\n    return pkg.run(count)\n"),
    ]);
    let report = obfuscate_with(
        dir.path(),
        &LexicalRenamer::default(),
        ObfuscateOptions::default(),
    );

    let issued: Vec<&str> = report
        .files
        .iter()
        .flat_map(|f| f.renames.iter().map(|r| r.new.as_str()))
        .collect();
    let unique: HashSet<&str> = issued.iter().copied().collect();
    assert_eq!(unique.len(), issued.len());
    assert!(report.is_success());

    // Package initialisers keep their name.
    assert!(dir.path().join("pkg/__init__.py").exists());
    assert!(report.files[0].renamed_to.is_none());
}

#[test]
fn preserved_names_are_neither_renamed_nor_issued() {
    let dir = project_with(&[("m.py", "def main(a):\n    return a\n")]);
    let mut project = Project::open(dir.path(), &ScanSettings::default()).unwrap();
    let mut names = NameAllocator::for_python();
    names.reserve(["main".to_string()]);
    let renamer = LexicalRenamer::new(["main".to_string()]);

    let report = Obfuscator::new(&mut project, &mut names, &renamer, bindings_only())
        .run()
        .unwrap();

    // `a` already exists in the project, so the parameter becomes `b`.
    assert_eq!(read(dir.path(), "m.py"), "def main(b):\n    return b\n");
    assert_eq!(report.skips(), 1);
    assert_eq!(report.files[0].skips[0].name, "main");
}

#[test]
fn allocator_state_carries_across_runs() {
    let first = project_with(&[("m.py", "alpha = 1\n")]);
    let second = project_with(&[("m.py", "beta = 2\n")]);
    let renamer = LexicalRenamer::default();
    let mut names = NameAllocator::for_python();

    for dir in [&first, &second] {
        let mut project = Project::open(dir.path(), &ScanSettings::default()).unwrap();
        Obfuscator::new(&mut project, &mut names, &renamer, bindings_only())
            .run()
            .unwrap();
    }

    assert_eq!(read(first.path(), "m.py"), "a = 1\n");
    assert_eq!(read(second.path(), "m.py"), "b = 2\n");
}
