use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Boundary checks so a change-set can only touch files inside the project.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Canonical path to the project root
    project_root: PathBuf,
    /// Directory names that must never be written into (e.g. `.git`, `venv`)
    forbidden_dirs: Vec<String>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside project: {path} (project: {project})")]
    OutsideProject { path: PathBuf, project: PathBuf },

    #[error("path is in excluded directory '{dir}': {path}")]
    ForbiddenPath { path: PathBuf, dir: String },

    #[error("failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectGuard {
    /// Create a guard for `project_root`, canonicalized to resolve symlinks.
    pub fn new(
        project_root: impl AsRef<Path>,
        forbidden_dirs: impl IntoIterator<Item = String>,
    ) -> Result<Self, SafetyError> {
        let project_root = canonicalize(project_root.as_ref())?;
        Ok(Self {
            project_root,
            forbidden_dirs: forbidden_dirs.into_iter().collect(),
        })
    }

    /// Check that an existing file may be edited; returns its canonical path.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(&self.absolute(path.as_ref()))?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    /// Check a file that does not exist yet (a move destination).
    ///
    /// The parent directory must exist; the returned path is the canonical
    /// parent joined with the file name.
    pub fn validate_destination(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let absolute = self.absolute(path.as_ref());
        let (parent, name) = match (absolute.parent(), absolute.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => {
                return Err(SafetyError::OutsideProject {
                    path: absolute.clone(),
                    project: self.project_root.clone(),
                })
            }
        };
        let canonical = canonicalize(parent)?.join(name);
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        let relative = canonical
            .strip_prefix(&self.project_root)
            .map_err(|_| SafetyError::OutsideProject {
                path: canonical.to_path_buf(),
                project: self.project_root.clone(),
            })?;

        for component in relative.components() {
            if let Component::Normal(part) = component {
                let part = part.to_string_lossy();
                if let Some(dir) = self
                    .forbidden_dirs
                    .iter()
                    .find(|d| d.as_str() == part.as_ref())
                {
                    return Err(SafetyError::ForbiddenPath {
                        path: canonical.to_path_buf(),
                        dir: dir.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}
