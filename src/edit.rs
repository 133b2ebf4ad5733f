//! Verified byte-span replacement.
//!
//! Every rewrite this crate performs (an identifier rename, a docstring
//! removal) compiles down to [`TextEdit`]s: a byte span, the text expected to
//! be there, and the replacement. Edits for one file are spliced in memory
//! bottom-to-top and the result is written back atomically.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A single byte-span replacement inside one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Absolute path of the file to edit
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// What the span must contain before the edit applies
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (used for large spans such as docstrings)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using a hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {file}:{byte_start} (found {found:?})")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("overlapping edits at bytes {first_end} and {second_start}")]
    Overlapping {
        first_end: usize,
        second_start: usize,
    },

    #[error("edit splits a UTF-8 character at byte {offset}")]
    CharBoundary { offset: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TextEdit {
    /// Create a new edit, verifying `expected_before` at apply time.
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    fn validate(&self, content: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::CharBoundary { offset });
            }
        }

        let current = &content[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(())
    }
}

/// Apply edits that all target the same content, returning the new text.
///
/// Every edit is verified against the original content before any splice.
/// Overlapping spans are rejected; the rest are applied bottom-to-top so
/// earlier offsets stay valid.
pub fn apply_to_content(content: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    for edit in edits {
        edit.validate(content)?;
    }

    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));

    // Sorted descending: the later edit must start at or after the earlier one's end.
    for window in ordered.windows(2) {
        let (later, earlier) = (window[0], window[1]);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::Overlapping {
                first_end: earlier.byte_end,
                second_start: later.byte_start,
            });
        }
    }

    let mut updated = content.to_string();
    for edit in ordered {
        updated.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
    }
    Ok(updated)
}

/// Atomic file write: tempfile in the same directory + fsync + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
