//! pyscramble: deterministic identifier obfuscation for Python source trees.
//!
//! Every programmer-chosen binding in a project is renamed to a short name
//! from an infinite base-26 sequence (`a`, `b`, ..., `z`, `aa`, ...), each
//! distinct name exactly once, and docstrings are stripped.
//!
//! # Architecture
//!
//! - [`extract`] walks a tree-sitter syntax tree and lists the bindings of
//!   one file with their byte offsets.
//! - [`stream::SymbolStream`] re-extracts after every rename, since each
//!   rename shifts the offsets of everything after it.
//! - [`names::NameAllocator`] issues fresh names and never repeats one.
//! - [`rename`] resolves a binding to every occurrence in the project and
//!   commits the resulting change-set.
//! - [`driver::Obfuscator`] ties these together, one file at a time.
//!
//! All rewrites compile down to [`edit::TextEdit`]: a verified byte-span
//! replacement, spliced bottom-to-top and written atomically.
//!
//! # Example
//!
//! ```no_run
//! use pyscramble::config::ScanSettings;
//! use pyscramble::driver::{ObfuscateOptions, Obfuscator};
//! use pyscramble::names::NameAllocator;
//! use pyscramble::rename::{LexicalRenamer, Project};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut project = Project::open("my_app", &ScanSettings::default())?;
//! let mut names = NameAllocator::for_python();
//! let renamer = LexicalRenamer::default();
//!
//! let report = Obfuscator::new(&mut project, &mut names, &renamer, ObfuscateOptions::default())
//!     .run()?;
//! println!("{} renames", report.renames());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod docstrings;
pub mod driver;
pub mod edit;
pub mod extract;
pub mod names;
pub mod pool;
pub mod rename;
pub mod safety;
pub mod stream;
pub mod ts;

// Re-exports
pub use config::{load_for_project, load_from_path, load_from_str, ConfigError, ObfuscateConfig};
pub use driver::{FileReport, FileState, ObfuscateOptions, Obfuscator, RunReport};
pub use edit::{EditError, EditVerification, TextEdit};
pub use extract::{extract_bindings, Binding, ExtractError, Extraction, UnsupportedNode};
pub use names::NameAllocator;
pub use rename::{ChangeError, ChangeSet, LexicalRenamer, Project, RenameError, RenameService};
pub use safety::{ProjectGuard, SafetyError};
pub use stream::{StreamError, SymbolStream};
pub use ts::TreeSitterError;
