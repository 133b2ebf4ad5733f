//! Rename requests and change-sets.
//!
//! A [`RenameService`] resolves a binding (or a whole module) into a
//! [`RenameRequest`]: the old name plus every occurrence that must change.
//! [`RenameRequest::changes`] turns it into a [`ChangeSet`] for a concrete
//! new name, which [`Project::apply_changes`] commits to disk.

pub mod lexical;
pub mod project;

pub use lexical::LexicalRenamer;
pub use project::{ChangeError, Project};

use crate::edit::TextEdit;
use crate::ts::python::{is_identifier, is_keyword};
use crate::ts::TreeSitterError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Resolves rename targets inside a project.
pub trait RenameService {
    /// With `offset`, target the identifier starting at that byte of `file`;
    /// without, target the module `file` itself.
    fn prepare_rename(
        &self,
        project: &Project,
        file: &Path,
        offset: Option<usize>,
    ) -> Result<RenameRequest, RenameError>;
}

/// One token to rewrite, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Occurrence {
    pub file: PathBuf,
    pub byte_start: usize,
}

/// A resolved rename target, not yet bound to a new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub old_name: String,
    pub occurrences: Vec<Occurrence>,
    /// Set for module renames: the file to move next to itself as `<new>.<ext>`
    pub module_file: Option<PathBuf>,
}

/// A file move, both paths relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Every edit and move needed to rename one binding or module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub description: String,
    pub edits: Vec<TextEdit>,
    pub moves: Vec<FileMove>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.moves.is_empty()
    }

    /// Files touched by the edits, deduplicated.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.edits.iter().map(|e| e.file.as_path()).collect();
        files.sort();
        files.dedup();
        files
    }
}

impl RenameRequest {
    /// Bind the request to `new_name`.
    pub fn changes(&self, new_name: &str) -> Result<ChangeSet, RenameError> {
        if !is_identifier(new_name) || is_keyword(new_name) {
            return Err(RenameError::InvalidNewName {
                name: new_name.to_string(),
            });
        }

        let edits = self
            .occurrences
            .iter()
            .map(|occurrence| {
                TextEdit::new(
                    occurrence.file.clone(),
                    occurrence.byte_start,
                    occurrence.byte_start + self.old_name.len(),
                    new_name,
                    &self.old_name,
                )
            })
            .collect();

        let moves = self
            .module_file
            .iter()
            .map(|from| {
                let mut to = from.with_file_name(new_name);
                if let Some(extension) = from.extension() {
                    to.set_extension(extension);
                }
                FileMove {
                    from: from.clone(),
                    to,
                }
            })
            .collect();

        Ok(ChangeSet {
            description: format!("rename '{}' to '{}'", self.old_name, new_name),
            edits,
            moves,
        })
    }
}

/// Why a name is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    Dunder,
    Keyword,
    Builtin,
    Preserved,
    ForeignImport,
    ForeignMember,
    ModuleName,
    InvalidModuleName,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Refusal::Dunder => "dunder names are part of the language protocol",
            Refusal::Keyword => "it is a Python keyword",
            Refusal::Builtin => "it is a Python builtin",
            Refusal::Preserved => "it is in the preserve list",
            Refusal::ForeignImport => "it is imported from outside the project",
            Refusal::ForeignMember => {
                "it is used as an attribute or keyword argument the project does not define"
            }
            Refusal::ModuleName => "it names a project module",
            Refusal::InvalidModuleName => "the file name is not a Python identifier",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("no identifier starts at byte {offset} of {file}")]
    NoIdentifier { file: PathBuf, offset: usize },

    #[error("refusing to rename '{name}': {reason}")]
    Refused { name: String, reason: Refusal },

    #[error("'{name}' cannot be used as a new name")]
    InvalidNewName { name: String },

    #[error("{file} is not part of the project")]
    UnknownFile { file: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),
}
