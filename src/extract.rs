//! Binding extraction.
//!
//! Walks a Python syntax tree and lists the introducing occurrence of every
//! programmer-chosen name: function and class definitions, formal
//! parameters, assignment targets, loop targets and `as` aliases of
//! exception handlers and `with` items. Traversal is top-down and
//! left-to-right, except that a definition's body (and, for functions, its
//! parameters) is visited before the definition's own name. The first
//! occurrence of a name in that order is the one kept.
//!
//! Node kinds outside the supported set contribute nothing and are reported
//! as [`UnsupportedNode`] diagnostics.

use crate::pool;
use crate::ts::python::node_kinds as kinds;
use crate::ts::TreeSitterError;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tree_sitter::Node;

/// A name found while walking the tree, with its tree position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    /// 1-based line number
    pub line: usize,
    /// 0-based byte column
    pub column: usize,
}

/// One renameable occurrence: a name and its absolute byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Binding {
    pub name: String,
    pub offset: usize,
}

/// A node the extractor does not look into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedNode {
    pub kind: String,
    pub line: usize,
}

/// Result of one extraction pass over a file's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Bindings in traversal order, unique by name
    pub bindings: Vec<Binding>,
    pub unsupported: Vec<UnsupportedNode>,
}

impl Extraction {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("syntax error at line {line}, column {column}")]
    Parse { line: usize, column: usize },

    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),
}

/// Converts (line, column) positions into absolute byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() / 32 + 1);
        let mut total = 0;
        starts.push(0);
        for line in text.split_inclusive('\n') {
            total += line.len();
            starts.push(total);
        }
        Self { starts }
    }

    /// Sum of the lengths of all lines before `line` (1-based), plus `column`.
    pub fn offset(&self, line: usize, column: usize) -> usize {
        let index = line.saturating_sub(1).min(self.starts.len() - 1);
        self.starts[index] + column
    }

    /// 1-based line and 0-based byte column of `offset`.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        (line, offset - self.starts[line - 1])
    }
}

/// Parse `source` and list its bindings.
pub fn extract_bindings(source: &str) -> Result<Extraction, ExtractError> {
    pool::with_parsed(source, |parsed| {
        if let Some(error) = parsed.error_nodes().first() {
            return Err(ExtractError::Parse {
                line: error.start_point.row + 1,
                column: error.start_point.column,
            });
        }

        let mut walker = Walker::new(parsed.source);
        walker.visit(parsed.root_node());
        Ok(walker.finish())
    })?
}

/// The node kinds the walker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Module,
    Block,
    FunctionDefinition,
    ClassDefinition,
    DecoratedDefinition,
    ExpressionStatement,
    Assignment,
    ForStatement,
    WhileStatement,
    IfStatement,
    ElifClause,
    ElseClause,
    TryStatement,
    ExceptClause,
    FinallyClause,
    WithStatement,
    WithClause,
    /// Statements that can only refer to names, never bind them.
    Leaf,
    ReturnStatement,
    Comment,
    Other,
}

impl NodeKind {
    fn of(node: &Node<'_>) -> Self {
        match node.kind() {
            kinds::MODULE => NodeKind::Module,
            kinds::BLOCK => NodeKind::Block,
            kinds::FUNCTION_DEF => NodeKind::FunctionDefinition,
            kinds::CLASS_DEF => NodeKind::ClassDefinition,
            kinds::DECORATED_DEF => NodeKind::DecoratedDefinition,
            kinds::EXPRESSION_STATEMENT => NodeKind::ExpressionStatement,
            kinds::ASSIGNMENT => NodeKind::Assignment,
            kinds::FOR_STATEMENT => NodeKind::ForStatement,
            kinds::WHILE_STATEMENT => NodeKind::WhileStatement,
            kinds::IF_STATEMENT => NodeKind::IfStatement,
            kinds::ELIF_CLAUSE => NodeKind::ElifClause,
            kinds::ELSE_CLAUSE => NodeKind::ElseClause,
            kinds::TRY_STATEMENT => NodeKind::TryStatement,
            kinds::EXCEPT_CLAUSE | kinds::EXCEPT_GROUP_CLAUSE => NodeKind::ExceptClause,
            kinds::FINALLY_CLAUSE => NodeKind::FinallyClause,
            kinds::WITH_STATEMENT => NodeKind::WithStatement,
            kinds::WITH_CLAUSE => NodeKind::WithClause,
            kinds::PASS_STATEMENT
            | kinds::BREAK_STATEMENT
            | kinds::CONTINUE_STATEMENT
            | kinds::GLOBAL_STATEMENT
            | kinds::NONLOCAL_STATEMENT => NodeKind::Leaf,
            kinds::RETURN_STATEMENT => NodeKind::ReturnStatement,
            kinds::COMMENT => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }
}

struct Walker<'s> {
    source: &'s str,
    identifiers: Vec<Identifier>,
    unsupported: Vec<UnsupportedNode>,
}

impl<'s> Walker<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            identifiers: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        match NodeKind::of(&node) {
            NodeKind::Module | NodeKind::Block => self.visit_named_children(node),
            NodeKind::FunctionDefinition => {
                self.visit_field(node, "body");
                if let Some(parameters) = node.child_by_field_name("parameters") {
                    self.visit_parameters(parameters);
                }
                self.push_field(node, "name");
            }
            NodeKind::ClassDefinition => {
                self.visit_field(node, "body");
                self.push_field(node, "name");
            }
            NodeKind::DecoratedDefinition => self.visit_field(node, "definition"),
            NodeKind::ExpressionStatement => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == kinds::ASSIGNMENT {
                        self.visit_assignment(child);
                    } else if let Some(introducer) = name_introducer(child) {
                        self.unsupported(introducer);
                    }
                }
            }
            NodeKind::Assignment => self.visit_assignment(node),
            NodeKind::ForStatement => {
                if let Some(target) = node.child_by_field_name("left") {
                    self.visit_target(target);
                }
                self.visit_field(node, "body");
                self.visit_field(node, "alternative");
            }
            NodeKind::WhileStatement => {
                self.visit_field(node, "body");
                self.visit_field(node, "alternative");
            }
            NodeKind::IfStatement => {
                self.visit_field(node, "consequence");
                let mut cursor = node.walk();
                let alternatives: Vec<Node<'_>> = node
                    .children_by_field_name("alternative", &mut cursor)
                    .collect();
                for alternative in alternatives {
                    self.visit(alternative);
                }
            }
            NodeKind::ElifClause => self.visit_field(node, "consequence"),
            NodeKind::ElseClause => self.visit_field(node, "body"),
            NodeKind::TryStatement => self.visit_named_children(node),
            NodeKind::ExceptClause => {
                self.visit_aliases(node);
                self.visit_blocks(node);
            }
            NodeKind::FinallyClause => self.visit_blocks(node),
            NodeKind::WithStatement => {
                let mut cursor = node.walk();
                let clauses: Vec<Node<'_>> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == kinds::WITH_CLAUSE)
                    .collect();
                for clause in clauses {
                    self.visit(clause);
                }
                self.visit_field(node, "body");
            }
            NodeKind::WithClause => {
                let mut cursor = node.walk();
                for item in node.named_children(&mut cursor) {
                    if item.kind() == kinds::WITH_ITEM {
                        self.visit_aliases(item);
                    }
                }
            }
            NodeKind::ReturnStatement => {
                if let Some(introducer) = name_introducer(node) {
                    self.unsupported(introducer);
                }
            }
            NodeKind::Leaf | NodeKind::Comment => {}
            NodeKind::Other => self.unsupported(node),
        }
    }

    fn visit_named_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    fn visit_blocks(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == kinds::BLOCK {
                self.visit(child);
            }
        }
    }

    fn visit_field(&mut self, node: Node<'_>, field: &str) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child);
        }
    }

    fn push_field(&mut self, node: Node<'_>, field: &str) {
        if let Some(name) = node.child_by_field_name(field) {
            self.push(name);
        }
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        if let Some(left) = node.child_by_field_name("left") {
            self.visit_target(left);
        }
        // `a = b = 1` nests the second assignment on the right.
        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == kinds::ASSIGNMENT {
                self.visit_assignment(right);
            }
        }
    }

    fn visit_target(&mut self, node: Node<'_>) {
        match node.kind() {
            kinds::IDENTIFIER => self.push(node),
            kinds::PATTERN_LIST
            | kinds::TUPLE_PATTERN
            | kinds::LIST_PATTERN
            | kinds::LIST_SPLAT_PATTERN
            | kinds::AS_PATTERN_TARGET => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.visit_target(child);
                }
            }
            _ => self.unsupported(node),
        }
    }

    fn visit_parameters(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for param in node.named_children(&mut cursor) {
            match param.kind() {
                kinds::IDENTIFIER => self.push(param),
                kinds::TYPED_PARAMETER => {
                    let mut inner = param.walk();
                    let first = param.named_children(&mut inner).next();
                    if let Some(first) = first {
                        self.visit_parameter_name(first);
                    }
                }
                kinds::DEFAULT_PARAMETER | kinds::TYPED_DEFAULT_PARAMETER => {
                    if let Some(name) = param.child_by_field_name("name") {
                        self.visit_parameter_name(name);
                    }
                }
                kinds::LIST_SPLAT_PATTERN | kinds::DICTIONARY_SPLAT_PATTERN => {
                    self.visit_parameter_name(param)
                }
                kinds::KEYWORD_SEPARATOR | kinds::POSITIONAL_SEPARATOR | kinds::COMMENT => {}
                _ => self.unsupported(param),
            }
        }
    }

    fn visit_parameter_name(&mut self, node: Node<'_>) {
        match node.kind() {
            kinds::IDENTIFIER => self.push(node),
            kinds::LIST_SPLAT_PATTERN | kinds::DICTIONARY_SPLAT_PATTERN => {
                let mut cursor = node.walk();
                let name = node
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == kinds::IDENTIFIER);
                if let Some(name) = name {
                    self.push(name);
                }
            }
            _ => self.unsupported(node),
        }
    }

    /// Names bound by `as` in an exception handler or `with` item.
    fn visit_aliases(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let mut after_as = false;
        for child in children {
            if child.kind() == "as" {
                after_as = true;
                continue;
            }
            if !child.is_named() {
                continue;
            }
            if child.kind() == kinds::AS_PATTERN {
                let mut inner = child.walk();
                let alias = child
                    .child_by_field_name("alias")
                    .or_else(|| child.named_children(&mut inner).last());
                if let Some(alias) = alias {
                    self.visit_target(alias);
                }
            } else if after_as {
                self.visit_target(child);
            }
            after_as = false;
        }
    }

    fn push(&mut self, node: Node<'_>) {
        let position = node.start_position();
        self.identifiers.push(Identifier {
            name: self.source[node.byte_range()].to_string(),
            line: position.row + 1,
            column: position.column,
        });
    }

    fn unsupported(&mut self, node: Node<'_>) {
        self.unsupported.push(UnsupportedNode {
            kind: node.kind().to_string(),
            line: node.start_position().row + 1,
        });
    }

    fn finish(self) -> Extraction {
        let index = LineIndex::new(self.source);
        let mut seen = HashSet::new();
        let bindings = self
            .identifiers
            .into_iter()
            .filter(|ident| seen.insert(ident.name.clone()))
            .map(|ident| Binding {
                offset: index.offset(ident.line, ident.column),
                name: ident.name,
            })
            .collect();

        Extraction {
            bindings,
            unsupported: self.unsupported,
        }
    }
}

/// The first walrus, lambda or comprehension inside an expression.
/// Anything else in an expression only refers to names.
fn name_introducer(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        kinds::NAMED_EXPRESSION
        | kinds::LAMBDA
        | kinds::LIST_COMPREHENSION
        | kinds::SET_COMPREHENSION
        | kinds::DICTIONARY_COMPREHENSION
        | kinds::GENERATOR_EXPRESSION => Some(node),
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            children.into_iter().find_map(name_introducer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<String> {
        extract_bindings(source)
            .unwrap()
            .bindings
            .into_iter()
            .map(|b| b.name)
            .collect()
    }

    #[test]
    fn parameters_come_before_function_name() {
        let extraction = extract_bindings("def foo(x): return x + 1\n").unwrap();
        assert_eq!(
            extraction.bindings,
            vec![
                Binding {
                    name: "x".into(),
                    offset: 8
                },
                Binding {
                    name: "foo".into(),
                    offset: 4
                },
            ]
        );
    }

    #[test]
    fn bodies_come_before_definition_names() {
        let source = r#"
class Greeter:
    def greet(self, name):
        message = "hi " + name
        return message
"#;
        assert_eq!(names(source), ["message", "self", "name", "greet", "Greeter"]);
    }

    #[test]
    fn offsets_point_at_names() {
        let source = "label = 'é'\n\nasync def fetch(url, *args, retries=3, **kw):\n    pass\n\n@decorator\nclass  Spaced:\n    pass\n";
        let extraction = extract_bindings(source).unwrap();

        for binding in &extraction.bindings {
            let end = binding.offset + binding.name.len();
            assert_eq!(&source[binding.offset..end], binding.name);
        }
        let found: Vec<&str> = extraction.names().collect();
        assert_eq!(found, ["label", "url", "args", "retries", "kw", "fetch", "Spaced"]);
    }

    #[test]
    fn first_occurrence_wins() {
        let source = "def first(x):\n    return x\n\ndef second(x):\n    return x\n";
        let extraction = extract_bindings(source).unwrap();

        let xs: Vec<&Binding> = extraction.bindings.iter().filter(|b| b.name == "x").collect();
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].offset, 10);
        assert_eq!(names(source), ["x", "first", "second"]);
    }

    #[test]
    fn control_flow_bodies_are_walked() {
        let source = r#"
for item in items:
    total = item
else:
    done = True
while running:
    step = 1
if flag:
    left = 1
elif other:
    middle = 2
else:
    right = 3
try:
    risky = 1
except ValueError as err:
    handled = err
else:
    fine = 1
finally:
    cleanup = 1
with open(path) as handle, lock:
    data = handle
"#;
        assert_eq!(
            names(source),
            [
                "item", "total", "done", "step", "left", "middle", "right", "risky", "err",
                "handled", "fine", "cleanup", "handle", "data"
            ]
        );
    }

    #[test]
    fn assignment_targets() {
        let source = "a = b = 1\nc, (d, *rest) = pair\n[e, f] = g\nh: int = 4\nobj.attr = 5\n";
        let extraction = extract_bindings(source).unwrap();

        let found: Vec<&str> = extraction.names().collect();
        assert_eq!(found, ["a", "b", "c", "d", "rest", "e", "f", "h"]);
        assert!(extraction.unsupported.iter().any(|u| u.kind == "attribute"));
    }

    #[test]
    fn unsupported_constructs_are_diagnostics() {
        let source = r#"
square = lambda value: value * value
[n for n in range(10)]
print(square(3))
"#;
        let extraction = extract_bindings(source).unwrap();

        let found: Vec<&str> = extraction.names().collect();
        assert_eq!(found, ["square"]);
        let kinds: Vec<&str> = extraction.unsupported.iter().map(|u| u.kind.as_str()).collect();
        assert_eq!(kinds, ["list_comprehension"]);
        assert_eq!(extraction.unsupported[0].line, 3);
    }

    #[test]
    fn statements_without_bindings_are_silent() {
        let source = r#"def run(items):
    """Doc."""
    for item in items:
        if item:
            continue
        break
    global counter
    print(items)
    return len(items)


def pick(items):
    return [i for i in items]
"#;
        let extraction = extract_bindings(source).unwrap();

        let found: Vec<&str> = extraction.names().collect();
        assert_eq!(found, ["item", "items", "run", "pick"]);
        assert_eq!(
            extraction.unsupported,
            vec![UnsupportedNode {
                kind: "list_comprehension".into(),
                line: 13,
            }]
        );
    }

    #[test]
    fn typed_parameters_and_async_statements() {
        let source = r#"async def f(x: int, *args: str, y: int = 2, **kw: dict):
    async for i in x:
        pass
    async with y as cm:
        pass
"#;
        let extraction = extract_bindings(source).unwrap();

        let found: Vec<&str> = extraction.names().collect();
        assert_eq!(found, ["i", "cm", "x", "args", "y", "kw", "f"]);
        for binding in &extraction.bindings {
            let end = binding.offset + binding.name.len();
            assert_eq!(&source[binding.offset..end], binding.name);
        }
        assert!(extraction.unsupported.is_empty());
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let result = extract_bindings("def broken(:\n    pass\n");
        assert!(matches!(result, Err(ExtractError::Parse { .. })));
    }

    #[test]
    fn extraction_is_idempotent() {
        let source = "def f(a, b):\n    c = a + b\n    return c\n";
        assert_eq!(
            extract_bindings(source).unwrap(),
            extract_bindings(source).unwrap()
        );
    }

    #[test]
    fn line_index_sums_preceding_lines() {
        let index = LineIndex::new("ab\r\ncde\n\nf");
        assert_eq!(index.offset(1, 1), 1);
        assert_eq!(index.offset(2, 0), 4);
        assert_eq!(index.offset(3, 0), 8);
        assert_eq!(index.offset(4, 0), 9);
        assert_eq!(index.position(9), (4, 0));
        assert_eq!(index.position(5), (2, 1));
    }
}
