//! Tree-sitter integration for Python sources.
//!
//! Parsing goes through the Python grammar shipped with `ast-grep-language`.
//! Everything downstream (binding extraction, renaming, docstring removal)
//! works on byte offsets taken from these trees.

pub mod errors;
pub mod parser;
pub mod python;
pub mod query;
pub mod validator;

pub use errors::TreeSitterError;
pub use parser::{ErrorNode, ParsedSource, PythonParser};
pub use query::{queries, QueryEngine, QueryMatch};
pub use validator::{validate_edit, validate_syntax};
