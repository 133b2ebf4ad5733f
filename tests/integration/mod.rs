//! End-to-end obfuscation scenarios over temporary Python projects.

mod obfuscate;
mod scenarios;

use pyscramble::config::ScanSettings;
use pyscramble::driver::{ObfuscateOptions, Obfuscator, RunReport};
use pyscramble::names::NameAllocator;
use pyscramble::rename::{Project, RenameService};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temp project from `(relative path, content)` pairs.
pub fn project_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

/// Obfuscate the project in `dir` with a fresh Python allocator.
pub fn obfuscate_with<R: RenameService>(
    dir: &Path,
    renamer: &R,
    options: ObfuscateOptions,
) -> RunReport {
    let mut project = Project::open(dir, &ScanSettings::default()).unwrap();
    let mut names = NameAllocator::for_python();
    Obfuscator::new(&mut project, &mut names, renamer, options)
        .run()
        .unwrap()
}

pub fn bindings_only() -> ObfuscateOptions {
    ObfuscateOptions {
        docstrings: false,
        modules: false,
    }
}

pub fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}
