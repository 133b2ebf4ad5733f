use crate::pool;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::ErrorNode;

/// Validate that Python source code has no syntax errors.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let errors = pool::with_parsed(source, |parsed| parsed.error_nodes())?;
    match errors.len() {
        0 => Ok(()),
        1 => Err(TreeSitterError::SyntaxError {
            byte_start: errors[0].byte_start,
            byte_end: errors[0].byte_end,
        }),
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}

/// Validate that replacing `original` with `edited` doesn't introduce syntax errors.
///
/// Errors already present in `original` are tolerated. Positions shift after an
/// edit, so errors are compared by count rather than by byte range.
pub fn validate_edit(original: &str, edited: &str) -> Result<(), TreeSitterError> {
    let before = pool::with_parsed(original, |parsed| parsed.error_nodes())?;
    let after = pool::with_parsed(edited, |parsed| parsed.error_nodes())?;

    if after.len() <= before.len() {
        return Ok(());
    }

    let introduced: Vec<&ErrorNode> = after
        .iter()
        .filter(|e| {
            !before
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .collect();

    match introduced.len() {
        0 | 1 => {
            let first = introduced.first().copied().unwrap_or(&after[0]);
            Err(TreeSitterError::SyntaxError {
                byte_start: first.byte_start,
                byte_end: first.byte_end,
            })
        }
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}
