//! Docstring removal.
//!
//! The docstring of a module, function or class is its first statement when
//! that statement is a lone plain string literal. A docstring that sits on
//! lines of its own is deleted together with those lines when something
//! else keeps the body non-empty; otherwise it becomes `pass`.

use crate::edit::TextEdit;
use crate::pool;
use crate::ts::python::node_kinds as kinds;
use crate::ts::{queries, QueryEngine, TreeSitterError};
use std::path::Path;
use tree_sitter::Node;

/// Edits that remove every docstring in `source`, tagged with `file`.
pub fn docstring_edits(file: &Path, source: &str) -> Result<Vec<TextEdit>, TreeSitterError> {
    let engine = QueryEngine::new(queries::DOCSTRINGS)?;

    pool::with_parsed(source, |parsed| {
        let root = parsed.root_node();
        engine
            .capture_ranges(parsed, "doc")
            .into_iter()
            .filter_map(|(start, end)| root.descendant_for_byte_range(start, end))
            .filter_map(statement_of)
            .filter(|statement| is_plain_docstring(*statement, source))
            .map(|statement| removal(file, statement, source))
            .collect()
    })
}

/// Climb from the string literal to the statement that holds it.
fn statement_of(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    while current.kind() != kinds::EXPRESSION_STATEMENT {
        current = current.parent()?;
    }
    Some(current)
}

fn is_plain_docstring(statement: Node<'_>, source: &str) -> bool {
    if statement.named_child_count() != 1 {
        return false;
    }
    let Some(literal) = statement.named_child(0) else {
        return false;
    };
    if literal.kind() != kinds::STRING {
        return false;
    }

    let mut cursor = literal.walk();
    let interpolated = literal
        .named_children(&mut cursor)
        .any(|c| c.kind() == kinds::INTERPOLATION);
    let text = &source[literal.byte_range()];
    let prefix: String = text.chars().take_while(|c| *c != '"' && *c != '\'').collect();

    !interpolated && !prefix.to_ascii_lowercase().contains('f')
}

fn removal(file: &Path, statement: Node<'_>, source: &str) -> TextEdit {
    let start = statement.start_byte();
    let end = statement.end_byte();

    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[end..].find('\n').map_or(source.len(), |i| end + i + 1);
    let own_lines = source[line_start..start].trim().is_empty()
        && source[end..line_end].trim().is_empty();

    let has_siblings = statement.parent().is_some_and(|container| {
        container.kind() == kinds::MODULE || {
            let mut cursor = container.walk();
            let others = container
                .named_children(&mut cursor)
                .filter(|c| c.kind() != kinds::COMMENT && c.id() != statement.id())
                .count();
            others > 0
        }
    });

    if own_lines && has_siblings {
        TextEdit::new(file, line_start, line_end, "", &source[line_start..line_end])
    } else {
        TextEdit::new(file, start, end, "pass", &source[start..end])
    }
}
