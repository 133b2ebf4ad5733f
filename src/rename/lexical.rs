//! Name-based rename service.
//!
//! A binding is renamed by rewriting every `identifier` token with the same
//! spelling anywhere in the project: definitions, references, import lists
//! and f-string interpolations. This is coarser than scope resolution but
//! consistent across files, which is what the obfuscator needs: one old name
//! maps to exactly one new name.
//!
//! Attribute names (`obj.name`) and keyword arguments (`f(name=...)`) are
//! only rewritten when the project defines that member or parameter itself,
//! and never when the receiver or callee starts at a builtin or a foreign
//! import. A name that also appears on objects the project does not own,
//! such as `os.path` or `d.items()`, is refused like any other foreign name.

use crate::pool;
use crate::rename::{Occurrence, Project, Refusal, RenameError, RenameRequest, RenameService};
use crate::ts::python::node_kinds as kinds;
use crate::ts::python::{is_builtin, is_dunder, is_identifier, is_keyword};
use crate::ts::{queries, ParsedSource, QueryEngine};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::trace;
use tree_sitter::Node;

#[derive(Debug, Clone, Default)]
pub struct LexicalRenamer {
    preserve: HashSet<String>,
}

/// How one name is spelled across the project.
#[derive(Debug, Default)]
struct Usage {
    occurrences: Vec<Occurrence>,
    foreign_import: bool,
    foreign_receiver: bool,
    as_member: bool,
    as_keyword: bool,
    defines_member: bool,
    defines_keyword: bool,
}

impl Usage {
    fn foreign_member(&self) -> bool {
        self.foreign_receiver
            || (self.as_member && !self.defines_member)
            || (self.as_keyword && !self.defines_keyword)
    }

    fn record(
        &mut self,
        file: &Path,
        parsed: &ParsedSource<'_>,
        imported: &BTreeSet<String>,
        (start, end): (usize, usize),
    ) {
        let Some(node) = parsed.root_node().descendant_for_byte_range(start, end) else {
            return;
        };
        let is_foreign = |owner: Option<Node<'_>>| {
            owner
                .and_then(|owner| head_name(owner, parsed.source))
                .is_some_and(|head| is_builtin(head) || imported.contains(head))
        };

        match role_of(node) {
            Role::Member(attribute) => {
                self.as_member = true;
                self.foreign_receiver |= is_foreign(attribute.child_by_field_name("object"));
                self.defines_member |= is_self_member_target(attribute, parsed.source);
            }
            Role::Keyword(call) => {
                self.as_keyword = true;
                self.foreign_receiver |= is_foreign(call.child_by_field_name("function"));
            }
            Role::Plain => {
                let class_binding = is_class_binding(node);
                self.defines_member |= class_binding || is_module_binding(node);
                self.defines_keyword |= class_binding || is_parameter(node);
            }
        }
        self.occurrences.push(Occurrence {
            file: file.to_path_buf(),
            byte_start: start,
        });
    }
}

impl LexicalRenamer {
    pub fn new(preserve: impl IntoIterator<Item = String>) -> Self {
        Self {
            preserve: preserve.into_iter().collect(),
        }
    }

    fn check_name(&self, name: &str) -> Result<(), Refusal> {
        if is_dunder(name) {
            Err(Refusal::Dunder)
        } else if is_keyword(name) {
            Err(Refusal::Keyword)
        } else if is_builtin(name) {
            Err(Refusal::Builtin)
        } else if self.preserve.contains(name) {
            Err(Refusal::Preserved)
        } else {
            Ok(())
        }
    }

    /// Every token spelled `name` in the project, with the context needed
    /// to decide whether the project owns it.
    fn scan(&self, project: &Project, name: &str) -> Result<Usage, RenameError> {
        let engine = QueryEngine::new(&queries::identifier_named(name))?;
        let modules = project.module_names();

        let mut usage = Usage::default();
        for file in project.files() {
            let path = project.resource(file);
            let source = std::fs::read_to_string(&path)
                .map_err(|source| RenameError::Read { path, source })?;
            if !source.contains(name) {
                continue;
            }

            let imported = pool::with_parsed(&source, |parsed| {
                let mut imported = BTreeSet::new();
                collect_foreign_imports(parsed.root_node(), parsed.source, &modules, &mut imported);
                for range in engine.capture_ranges(parsed, "id") {
                    usage.record(file, parsed, &imported, range);
                }
                imported
            })?;
            usage.foreign_import |= imported.contains(name);
        }

        trace!(
            name,
            occurrences = usage.occurrences.len(),
            foreign_import = usage.foreign_import,
            as_member = usage.as_member,
            as_keyword = usage.as_keyword,
            "scanned project"
        );
        Ok(usage)
    }

    fn request(
        &self,
        project: &Project,
        name: &str,
        module_file: Option<&Path>,
    ) -> Result<RenameRequest, RenameError> {
        let refuse = |reason| RenameError::Refused {
            name: name.to_string(),
            reason,
        };

        self.check_name(name).map_err(refuse)?;
        if module_file.is_none() && project.module_names().contains(name) {
            return Err(refuse(Refusal::ModuleName));
        }

        let usage = self.scan(project, name)?;
        if usage.foreign_import {
            return Err(refuse(Refusal::ForeignImport));
        }
        if usage.foreign_member() {
            return Err(refuse(Refusal::ForeignMember));
        }

        Ok(RenameRequest {
            old_name: name.to_string(),
            occurrences: usage.occurrences,
            module_file: module_file.map(Path::to_path_buf),
        })
    }
}

impl RenameService for LexicalRenamer {
    fn prepare_rename(
        &self,
        project: &Project,
        file: &Path,
        offset: Option<usize>,
    ) -> Result<RenameRequest, RenameError> {
        if !project.contains(file) {
            return Err(RenameError::UnknownFile {
                file: file.to_path_buf(),
            });
        }

        let Some(offset) = offset else {
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if !is_identifier(stem) {
                return Err(RenameError::Refused {
                    name: stem.to_string(),
                    reason: Refusal::InvalidModuleName,
                });
            }
            return self.request(project, stem, Some(file));
        };

        let path = project.resource(file);
        let source = std::fs::read_to_string(&path)
            .map_err(|source| RenameError::Read { path, source })?;
        let name = pool::with_parsed(&source, |parsed| {
            identifier_at(parsed.root_node(), offset).map(|node| parsed.node_text(node).to_string())
        })?
        .ok_or_else(|| RenameError::NoIdentifier {
            file: file.to_path_buf(),
            offset,
        })?;

        self.request(project, &name, None)
    }
}

/// The identifier node starting exactly at `offset`.
fn identifier_at(root: Node<'_>, offset: usize) -> Option<Node<'_>> {
    if offset >= root.end_byte() {
        return None;
    }
    root.named_descendant_for_byte_range(offset, offset + 1)
        .filter(|node| node.kind() == kinds::IDENTIFIER && node.start_byte() == offset)
}

enum Role<'t> {
    Plain,
    /// The `name` of `obj.name`; carries the attribute node.
    Member(Node<'t>),
    /// The `name` of `f(name=value)`; carries the call or class definition.
    Keyword(Node<'t>),
}

fn role_of(node: Node<'_>) -> Role<'_> {
    let Some(parent) = node.parent() else {
        return Role::Plain;
    };
    match parent.kind() {
        kinds::ATTRIBUTE if parent.child_by_field_name("attribute") == Some(node) => {
            Role::Member(parent)
        }
        kinds::KEYWORD_ARGUMENT if parent.child_by_field_name("name") == Some(node) => {
            match parent.parent().and_then(|arguments| arguments.parent()) {
                Some(call) => Role::Keyword(call),
                None => Role::Plain,
            }
        }
        _ => Role::Plain,
    }
}

/// The leftmost name of a receiver or callee: `os` in `os.path.join()`.
fn head_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let mut current = node;
    loop {
        match current.kind() {
            kinds::IDENTIFIER => return Some(&source[current.byte_range()]),
            kinds::ATTRIBUTE => current = current.child_by_field_name("object")?,
            kinds::CALL => current = current.child_by_field_name("function")?,
            _ => return None,
        }
    }
}

/// `self.name = ...` or `cls.name = ...`.
fn is_self_member_target(attribute: Node<'_>, source: &str) -> bool {
    let receiver = attribute
        .child_by_field_name("object")
        .map(|object| &source[object.byte_range()]);
    matches!(receiver, Some("self" | "cls")) && is_assignment_target(attribute)
}

/// Whether `node` is written to by an assignment, possibly inside a pattern.
fn is_assignment_target(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            kinds::PATTERN_LIST
            | kinds::TUPLE_PATTERN
            | kinds::LIST_PATTERN
            | kinds::LIST_SPLAT_PATTERN => current = parent,
            kinds::ASSIGNMENT | kinds::AUGMENTED_ASSIGNMENT => {
                return parent.child_by_field_name("left") == Some(current);
            }
            _ => return false,
        }
    }
    false
}

/// The block or module holding the statement that binds `node`, for
/// `def`/`class` names and assignment targets.
fn binding_scope(node: Node<'_>) -> Option<Node<'_>> {
    let parent = node.parent()?;
    let statement = match parent.kind() {
        kinds::FUNCTION_DEF | kinds::CLASS_DEF
            if parent.child_by_field_name("name") == Some(node) =>
        {
            match parent.parent() {
                Some(decorated) if decorated.kind() == kinds::DECORATED_DEF => decorated,
                _ => parent,
            }
        }
        _ if is_assignment_target(node) => {
            let mut statement = parent;
            while statement.kind() != kinds::EXPRESSION_STATEMENT {
                statement = statement.parent()?;
            }
            statement
        }
        _ => return None,
    };
    statement.parent()
}

fn is_module_binding(node: Node<'_>) -> bool {
    binding_scope(node).is_some_and(|scope| scope.kind() == kinds::MODULE)
}

fn is_class_binding(node: Node<'_>) -> bool {
    binding_scope(node).is_some_and(|scope| {
        scope.kind() == kinds::BLOCK
            && scope.parent().is_some_and(|owner| owner.kind() == kinds::CLASS_DEF)
    })
}

/// Whether `node` names a parameter of a `def` (lambdas take no keywords
/// worth tracking).
fn is_parameter(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            kinds::PARAMETERS => return true,
            kinds::LIST_SPLAT_PATTERN | kinds::DICTIONARY_SPLAT_PATTERN => {}
            kinds::TYPED_PARAMETER => {
                let mut cursor = parent.walk();
                let first = parent.named_children(&mut cursor).next();
                if first != Some(current) {
                    return false;
                }
            }
            kinds::DEFAULT_PARAMETER | kinds::TYPED_DEFAULT_PARAMETER => {
                if parent.child_by_field_name("name") != Some(current) {
                    return false;
                }
            }
            _ => return false,
        }
        current = parent;
    }
    false
}

/// Names brought in by imports from modules the project does not contain.
///
/// For `import os.path as p` and `from os import path as p` the module path
/// and the imported names (`os`, `path`) are foreign; the local alias `p`
/// is not. Relative imports always point inside the project.
fn collect_foreign_imports(
    node: Node<'_>,
    source: &str,
    modules: &BTreeSet<String>,
    out: &mut BTreeSet<String>,
) {
    match node.kind() {
        kinds::IMPORT_STATEMENT => {
            let mut cursor = node.walk();
            for imported in node.children_by_field_name("name", &mut cursor) {
                let dotted = imported_path(imported);
                if let Some(dotted) = dotted {
                    if !is_internal(dotted, source, modules) {
                        dotted_parts(dotted, source, out);
                    }
                }
            }
        }
        kinds::IMPORT_FROM_STATEMENT => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return;
            };
            if module.kind() == kinds::RELATIVE_IMPORT || is_internal(module, source, modules) {
                return;
            }
            dotted_parts(module, source, out);

            let mut cursor = node.walk();
            for imported in node.children_by_field_name("name", &mut cursor) {
                if let Some(dotted) = imported_path(imported) {
                    dotted_parts(dotted, source, out);
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_foreign_imports(child, source, modules, out);
            }
        }
    }
}

/// The dotted name of an import item, looking through `as` aliases.
fn imported_path(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        kinds::DOTTED_NAME => Some(node),
        kinds::ALIASED_IMPORT => node.child_by_field_name("name"),
        _ => None,
    }
}

fn is_internal(dotted: Node<'_>, source: &str, modules: &BTreeSet<String>) -> bool {
    let mut cursor = dotted.walk();
    let first = dotted
        .named_children(&mut cursor)
        .next()
        .map(|n| &source[n.byte_range()]);
    first.is_some_and(|head| modules.contains(head))
}

fn dotted_parts(dotted: Node<'_>, source: &str, out: &mut BTreeSet<String>) {
    let mut cursor = dotted.walk();
    for part in dotted.named_children(&mut cursor) {
        if part.kind() == kinds::IDENTIFIER {
            out.insert(source[part.byte_range()].to_string());
        }
    }
}
