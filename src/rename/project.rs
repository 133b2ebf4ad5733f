use crate::config::ScanSettings;
use crate::edit::{self, EditError, TextEdit};
use crate::pool;
use crate::rename::ChangeSet;
use crate::safety::{ProjectGuard, SafetyError};
use crate::ts::{validate_edit, QueryEngine, TreeSitterError};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ChangeError {
    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("edit would break the syntax of {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error("cannot move {from} to {to}: destination exists")]
    DestinationExists { from: PathBuf, to: PathBuf },

    #[error("failed to walk project directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),
}

/// The source tree being obfuscated.
///
/// Holds the canonical root and the project-relative paths of every source
/// file, in walker order. All writes go through [`Project::apply_changes`].
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    files: Vec<PathBuf>,
    guard: ProjectGuard,
}

impl Project {
    /// Walk `root` and collect its source files, sorted by file name at
    /// every directory level.
    pub fn open(root: impl AsRef<Path>, scan: &ScanSettings) -> Result<Self, ChangeError> {
        let guard = ProjectGuard::new(root, scan.exclude.iter().cloned())?;
        let root = guard.project_root().to_path_buf();

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !scan.exclude.iter().any(|d| e.file_name() == d.as_str())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let wanted = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| scan.extensions.iter().any(|e| e == ext));
            if wanted {
                if let Ok(relative) = path.strip_prefix(&root) {
                    files.push(relative.to_path_buf());
                }
            }
        }

        info!(root = %root.display(), files = files.len(), "opened project");
        Ok(Self { root, files, guard })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source files relative to the root, in walker order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, relative: &Path) -> bool {
        self.files.iter().any(|f| f == relative)
    }

    /// Absolute location of a project-relative path.
    pub fn resource(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read(&self, relative: &Path) -> Result<String, ChangeError> {
        let path = self.resource(relative);
        fs::read_to_string(&path).map_err(|source| ChangeError::Io { path, source })
    }

    /// Names that import statements can refer to: file stems and the
    /// directories that hold source files.
    pub fn module_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for file in &self.files {
            if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
            if let Some(parent) = file.parent() {
                for component in parent.components() {
                    if let Some(dir) = component.as_os_str().to_str() {
                        names.insert(dir.to_string());
                    }
                }
            }
        }
        names
    }

    /// Every identifier token spelled anywhere in the project.
    pub fn identifiers(&self) -> Result<BTreeSet<String>, ChangeError> {
        let engine = QueryEngine::new("(identifier) @id")?;
        let mut names = BTreeSet::new();
        for file in &self.files {
            let source = self.read(file)?;
            let ranges = pool::with_parsed(&source, |parsed| engine.capture_ranges(parsed, "id"))?;
            names.extend(ranges.into_iter().map(|(start, end)| source[start..end].to_string()));
        }
        Ok(names)
    }

    /// Commit a change-set.
    ///
    /// Every edited file is verified and rewritten in memory before anything
    /// touches the disk; a failure there leaves the project unchanged.
    /// Python files must not gain syntax errors.
    pub fn apply_changes(&mut self, changes: &ChangeSet) -> Result<(), ChangeError> {
        if changes.is_empty() {
            debug!(description = %changes.description, "nothing to apply");
            return Ok(());
        }

        let mut by_file: BTreeMap<&Path, Vec<TextEdit>> = BTreeMap::new();
        for edit in &changes.edits {
            by_file
                .entry(edit.file.as_path())
                .or_default()
                .push(edit.clone());
        }

        let mut writes = Vec::with_capacity(by_file.len());
        for (relative, edits) in &by_file {
            let path = self.guard.validate_path(self.resource(relative))?;
            let original = fs::read_to_string(&path).map_err(|source| ChangeError::Io {
                path: path.clone(),
                source,
            })?;
            let updated = edit::apply_to_content(&original, edits)?;
            if is_python(relative) {
                validate_edit(&original, &updated).map_err(|source| ChangeError::Syntax {
                    path: relative.to_path_buf(),
                    source,
                })?;
            }
            writes.push((path, updated));
        }

        let mut moves = Vec::with_capacity(changes.moves.len());
        for file_move in &changes.moves {
            let from = self.guard.validate_path(self.resource(&file_move.from))?;
            let to = self.guard.validate_destination(self.resource(&file_move.to))?;
            if to.exists() {
                return Err(ChangeError::DestinationExists {
                    from: file_move.from.clone(),
                    to: file_move.to.clone(),
                });
            }
            moves.push((from, to, file_move));
        }

        for (path, content) in writes {
            edit::atomic_write(&path, content.as_bytes())?;
        }

        for (from, to, file_move) in moves {
            fs::rename(&from, &to).map_err(|source| ChangeError::Io {
                path: from.clone(),
                source,
            })?;
            if let Some(entry) = self.files.iter_mut().find(|f| **f == file_move.from) {
                *entry = file_move.to.clone();
            }
        }

        debug!(
            change = %changes.description,
            files = by_file.len(),
            edits = changes.edits.len(),
            moves = changes.moves.len(),
            "applied change-set"
        );
        Ok(())
    }
}

fn is_python(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename::FileMove;

    fn scan() -> ScanSettings {
        ScanSettings::default()
    }

    fn fixture(files: &[(&str, &str)]) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let path = temp_dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn walks_sorted_and_skips_excluded() {
        let temp_dir = fixture(&[
            ("zeta.py", ""),
            ("alpha.py", ""),
            ("pkg/inner.py", ""),
            ("notes.txt", ""),
            ("venv/lib/site.py", ""),
            ("__pycache__/alpha.py", ""),
        ]);

        let project = Project::open(temp_dir.path(), &scan()).unwrap();
        let files: Vec<&str> = project.files().iter().map(|f| f.to_str().unwrap()).collect();
        assert_eq!(files, ["alpha.py", "pkg/inner.py", "zeta.py"]);
    }

    #[test]
    fn module_names_include_packages() {
        let temp_dir = fixture(&[("app.py", ""), ("pkg/__init__.py", ""), ("pkg/util.py", "")]);
        let project = Project::open(temp_dir.path(), &scan()).unwrap();

        let names = project.module_names();
        assert!(names.contains("app"));
        assert!(names.contains("pkg"));
        assert!(names.contains("util"));
        assert!(names.contains("__init__"));
    }

    #[test]
    fn identifiers_span_all_files() {
        let temp_dir = fixture(&[("a.py", "alpha = beta\n"), ("b.py", "def gamma(): pass\n")]);
        let project = Project::open(temp_dir.path(), &scan()).unwrap();

        let names = project.identifiers().unwrap();
        let expected: BTreeSet<String> =
            ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn empty_change_set_touches_nothing() {
        let temp_dir = fixture(&[("a.py", "x = 1\n")]);
        let mut project = Project::open(temp_dir.path(), &scan()).unwrap();
        let changes = ChangeSet {
            description: "rename 'x' to 'x'".into(),
            edits: Vec::new(),
            moves: Vec::new(),
        };

        assert!(changes.is_empty());
        project.apply_changes(&changes).unwrap();
        assert_eq!(project.files(), [PathBuf::from("a.py")]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("a.py")).unwrap(), "x = 1\n");
    }

    #[test]
    fn apply_changes_edits_and_moves() {
        let temp_dir = fixture(&[("helper.py", "value = 1\n"), ("app.py", "import helper\n")]);
        let mut project = Project::open(temp_dir.path(), &scan()).unwrap();

        let changes = ChangeSet {
            description: "rename 'helper' to 'h'".into(),
            edits: vec![TextEdit::new("app.py", 7, 13, "h", "helper")],
            moves: vec![FileMove {
                from: "helper.py".into(),
                to: "h.py".into(),
            }],
        };
        project.apply_changes(&changes).unwrap();

        assert_eq!(fs::read_to_string(temp_dir.path().join("app.py")).unwrap(), "import h\n");
        assert!(temp_dir.path().join("h.py").exists());
        assert!(!temp_dir.path().join("helper.py").exists());
        assert!(project.contains(Path::new("h.py")));
        assert!(!project.contains(Path::new("helper.py")));
    }

    #[test]
    fn syntax_breaking_change_is_rejected_without_writing() {
        let temp_dir = fixture(&[("a.py", "value = 1\n"), ("b.py", "other = 2\n")]);
        let mut project = Project::open(temp_dir.path(), &scan()).unwrap();

        let changes = ChangeSet {
            description: "break".into(),
            edits: vec![
                TextEdit::new("a.py", 0, 5, "v", "value"),
                TextEdit::new("b.py", 0, 5, "if", "other"),
            ],
            moves: vec![],
        };
        let result = project.apply_changes(&changes);

        assert!(matches!(result, Err(ChangeError::Syntax { .. })));
        assert_eq!(fs::read_to_string(temp_dir.path().join("a.py")).unwrap(), "value = 1\n");
    }

    #[test]
    fn existing_destination_is_rejected() {
        let temp_dir = fixture(&[("a.py", ""), ("b.py", "")]);
        let mut project = Project::open(temp_dir.path(), &scan()).unwrap();

        let changes = ChangeSet {
            description: "move".into(),
            edits: vec![],
            moves: vec![FileMove {
                from: "a.py".into(),
                to: "b.py".into(),
            }],
        };
        assert!(matches!(
            project.apply_changes(&changes),
            Err(ChangeError::DestinationExists { .. })
        ));
    }
}
