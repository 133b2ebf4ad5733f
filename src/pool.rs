//! Thread-local parser pooling.
//!
//! The symbol stream re-parses a file after every rename, and the renamer
//! parses every project file per request, so parser construction sits on the
//! hot path. One parser is created lazily per thread and reused.

use crate::ts::{ParsedSource, PythonParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static PYTHON_PARSER: RefCell<Option<PythonParser>> = const { RefCell::new(None) };
}

/// Execute function with the pooled parser instance.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pyscramble::pool::with_parser;
///
/// let has_errors = with_parser(|parser| {
///     parser.parse_with_source("def main(): pass\n").map(|p| p.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut PythonParser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => parser,
            None => PythonParser::new()?,
        };
        Ok(f(slot.insert(parser)))
    })
}

/// Parse `source` with the pooled parser and hand the result to `f`.
pub fn with_parsed<F, R>(source: &str, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&ParsedSource<'_>) -> R,
{
    with_parser(|parser| parser.parse_with_source(source).map(|parsed| f(&parsed)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_parser_is_reused() {
        let first = with_parsed("x = 1\n", |parsed| parsed.root_node().kind()).unwrap();
        let second = with_parsed("def f(): pass\n", |parsed| parsed.has_errors()).unwrap();

        assert_eq!(first, "module");
        assert!(!second);
    }
}
