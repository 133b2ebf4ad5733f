//! Lazy stream of bindings over a file that changes under it.
//!
//! Every rename rewrites the file and invalidates all offsets computed
//! before it, so each pull re-reads the file and re-runs extraction. The
//! names owed are fixed by the first extraction; each pull yields the first
//! binding of the fresh extraction whose name is still owed.
//!
//! Processing order therefore follows the current traversal order of the
//! mutated file, not the original textual order. It is deterministic for a
//! deterministic extractor and renamer.

use crate::extract::{extract_bindings, Binding, ExtractError, UnsupportedNode};
use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot extract bindings from {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
}

/// Yields each distinct binding name of one file exactly once, with an
/// offset valid for the file's content at the time of the pull.
///
/// After an error the stream is finished.
#[derive(Debug)]
pub struct SymbolStream {
    path: PathBuf,
    /// Seeded on the first pull
    pending: Option<Vec<String>>,
    diagnostics: Vec<UnsupportedNode>,
    finished: bool,
}

impl SymbolStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: None,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names still owed. Empty before the first pull.
    pub fn pending(&self) -> &[String] {
        self.pending.as_deref().unwrap_or_default()
    }

    /// Unsupported nodes reported by the first extraction.
    pub fn diagnostics(&self) -> &[UnsupportedNode] {
        &self.diagnostics
    }

    fn pull(&mut self) -> Result<Option<Binding>, StreamError> {
        let source = fs::read_to_string(&self.path).map_err(|source| StreamError::Read {
            path: self.path.clone(),
            source,
        })?;
        let extraction = extract_bindings(&source).map_err(|source| StreamError::Extract {
            path: self.path.clone(),
            source,
        })?;

        if self.pending.is_none() {
            for node in &extraction.unsupported {
                debug!(
                    file = %self.path.display(),
                    kind = %node.kind,
                    line = node.line,
                    "node kind not handled, names inside are left as is"
                );
            }
            self.diagnostics = extraction.unsupported.clone();
        }
        let pending = self
            .pending
            .get_or_insert_with(|| extraction.names().map(str::to_string).collect());

        let next = extraction
            .bindings
            .into_iter()
            .find(|binding| pending.contains(&binding.name));

        if let Some(binding) = &next {
            pending.retain(|name| name != &binding.name);
            trace!(name = %binding.name, remaining = pending.len(), "next pending binding");
        }
        Ok(next)
    }
}

impl Iterator for SymbolStream {
    type Item = Result<Binding, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.pull() {
            Ok(Some(binding)) => Some(Ok(binding)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for SymbolStream {}
