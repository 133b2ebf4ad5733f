//! The rename driver.
//!
//! Files are processed one at a time in walker order. Each file runs
//! through `Unprocessed -> Streaming -> DocsStripped -> ModuleRenamed ->
//! Done`, or stops at `Aborted` when its symbol stream fails. Within a file
//! every binding is renamed to a freshly allocated name and the change-set
//! is committed before the next binding is pulled.
//!
//! A failed rename is logged and skipped. Its allocated name stays used.

use crate::config::RenameSettings;
use crate::docstrings::docstring_edits;
use crate::extract::{Binding, UnsupportedNode};
use crate::names::NameAllocator;
use crate::rename::{ChangeError, ChangeSet, Project, RenameError, RenameService};
use crate::stream::SymbolStream;
use crate::ts::TreeSitterError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Optional phases that run after a file's bindings are renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObfuscateOptions {
    pub docstrings: bool,
    pub modules: bool,
}

impl Default for ObfuscateOptions {
    fn default() -> Self {
        Self {
            docstrings: true,
            modules: true,
        }
    }
}

impl From<&RenameSettings> for ObfuscateOptions {
    fn from(settings: &RenameSettings) -> Self {
        Self {
            docstrings: settings.docstrings,
            modules: settings.modules,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Unprocessed,
    Streaming,
    DocsStripped,
    ModuleRenamed,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRename {
    pub old: String,
    /// `None` for the module rename
    pub offset: Option<usize>,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRename {
    pub name: String,
    pub offset: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path relative to the project root, before any module rename
    pub path: PathBuf,
    pub state: FileState,
    pub renamed_to: Option<PathBuf>,
    pub renames: Vec<AppliedRename>,
    pub skips: Vec<SkippedRename>,
    pub docstrings_removed: usize,
    pub unsupported: Vec<UnsupportedNode>,
    pub error: Option<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: FileState::Unprocessed,
            renamed_to: None,
            renames: Vec::new(),
            skips: Vec::new(),
            docstrings_removed: 0,
            unsupported: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn renames(&self) -> usize {
        self.files.iter().map(|f| f.renames.len()).sum()
    }

    pub fn skips(&self) -> usize {
        self.files.iter().map(|f| f.skips.len()).sum()
    }

    pub fn aborted(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == FileState::Aborted)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.aborted() == 0
    }
}

/// Why one rename step did not happen.
#[derive(Error, Debug)]
enum StepError {
    #[error(transparent)]
    Rename(#[from] RenameError),

    #[error(transparent)]
    Apply(#[from] ChangeError),

    #[error(transparent)]
    Parse(#[from] TreeSitterError),
}

/// Drives renames over a whole project.
///
/// The allocator is borrowed, not owned: its history must outlive any one
/// run so names are never reissued.
pub struct Obfuscator<'a, R: RenameService> {
    project: &'a mut Project,
    names: &'a mut NameAllocator,
    renamer: &'a R,
    options: ObfuscateOptions,
}

impl<'a, R: RenameService> Obfuscator<'a, R> {
    pub fn new(
        project: &'a mut Project,
        names: &'a mut NameAllocator,
        renamer: &'a R,
        options: ObfuscateOptions,
    ) -> Self {
        Self {
            project,
            names,
            renamer,
            options,
        }
    }

    /// Reserve every name already spelled in the project so issued names
    /// never collide with existing ones.
    pub fn reserve_existing_names(&mut self) -> Result<(), ChangeError> {
        self.names.reserve(self.project.identifiers()?);
        self.names.reserve(self.project.module_names());
        Ok(())
    }

    /// Reserve existing names, then process every project file.
    pub fn run(&mut self) -> Result<RunReport, ChangeError> {
        self.reserve_existing_names()?;

        let files = self.project.files().to_vec();
        let mut report = RunReport::default();
        for file in &files {
            report.files.push(self.process_file(file));
        }

        info!(
            files = report.files.len(),
            renames = report.renames(),
            skips = report.skips(),
            aborted = report.aborted(),
            "run complete"
        );
        Ok(report)
    }

    /// Run one file through every phase.
    pub fn process_file(&mut self, file: &Path) -> FileReport {
        let mut report = FileReport::new(file);
        info!(file = %file.display(), "processing");

        advance(&mut report, FileState::Streaming);
        let mut stream = SymbolStream::new(self.project.resource(file));
        while let Some(item) = stream.next() {
            match item {
                Ok(binding) => self.rename_binding(file, binding, &mut report),
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "aborting file");
                    advance(&mut report, FileState::Aborted);
                    report.error = Some(err.to_string());
                    report.unsupported = stream.diagnostics().to_vec();
                    return report;
                }
            }
        }
        report.unsupported = stream.diagnostics().to_vec();

        if self.options.docstrings {
            match self.strip_docstrings(file) {
                Ok(removed) => report.docstrings_removed = removed,
                Err(err) => warn!(file = %file.display(), error = %err, "docstrings kept"),
            }
        }
        advance(&mut report, FileState::DocsStripped);

        if self.options.modules {
            self.rename_module(file, &mut report);
        }
        advance(&mut report, FileState::ModuleRenamed);

        advance(&mut report, FileState::Done);
        report
    }

    fn rename_binding(&mut self, file: &Path, binding: Binding, report: &mut FileReport) {
        if self.names.is_issued(&binding.name) {
            debug!(name = %binding.name, "already obfuscated");
            report.skips.push(SkippedRename {
                name: binding.name,
                offset: Some(binding.offset),
                reason: "name was issued earlier in this run".to_string(),
            });
            return;
        }

        let new_name = self.names.next();
        match self.rename(file, Some(binding.offset), &new_name) {
            Ok(_) => {
                info!(
                    file = %file.display(),
                    old = %binding.name,
                    offset = binding.offset,
                    new = %new_name,
                    "renamed"
                );
                report.renames.push(AppliedRename {
                    old: binding.name,
                    offset: Some(binding.offset),
                    new: new_name,
                });
            }
            Err(err) => {
                warn!(
                    file = %file.display(),
                    name = %binding.name,
                    offset = binding.offset,
                    error = %err,
                    "skipped"
                );
                report.skips.push(SkippedRename {
                    name: binding.name,
                    offset: Some(binding.offset),
                    reason: err.to_string(),
                });
            }
        }
    }

    fn rename_module(&mut self, file: &Path, report: &mut FileReport) {
        let old = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_name = self.names.next();

        match self.rename(file, None, &new_name) {
            Ok(changes) => {
                let target = changes.moves.first().map(|m| m.to.clone());
                info!(
                    file = %file.display(),
                    old = %old,
                    new = %new_name,
                    "renamed module"
                );
                report.renames.push(AppliedRename {
                    old,
                    offset: None,
                    new: new_name,
                });
                report.renamed_to = target;
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "module kept its name");
                report.skips.push(SkippedRename {
                    name: old,
                    offset: None,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn rename(
        &mut self,
        file: &Path,
        offset: Option<usize>,
        new_name: &str,
    ) -> Result<ChangeSet, StepError> {
        let request = self.renamer.prepare_rename(&*self.project, file, offset)?;
        let changes = request.changes(new_name)?;
        self.project.apply_changes(&changes)?;
        Ok(changes)
    }

    fn strip_docstrings(&mut self, file: &Path) -> Result<usize, StepError> {
        let source = self.project.read(file)?;
        let edits = docstring_edits(file, &source)?;
        if edits.is_empty() {
            return Ok(0);
        }

        let removed = edits.len();
        let changes = ChangeSet {
            description: format!("strip docstrings from {}", file.display()),
            edits,
            moves: Vec::new(),
        };
        self.project.apply_changes(&changes)?;
        debug!(file = %file.display(), removed, "stripped docstrings");
        Ok(removed)
    }
}

fn advance(report: &mut FileReport, state: FileState) {
    trace!(file = %report.path.display(), from = ?report.state, to = ?state, "file state");
    report.state = state;
}
