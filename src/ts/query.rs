use crate::ts::errors::TreeSitterError;
use crate::ts::parser::ParsedSource;
use ast_grep_language::{LanguageExt, SupportLang};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// The full match byte range
    pub byte_start: usize,
    pub byte_end: usize,
    /// Named captures: capture_name -> captured node
    pub captures: HashMap<String, CapturedNode>,
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    pub kind: String,
}

/// Engine for executing tree-sitter queries against parsed Python source.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a query written in tree-sitter's S-expression syntax, e.g.
    ///
    /// ```text
    /// (function_definition
    ///   name: (identifier) @name
    ///   body: (block) @body)
    /// ```
    pub fn new(query_str: &str) -> Result<Self, TreeSitterError> {
        let language = SupportLang::Python.get_ts_language();
        let query = Query::new(&language, query_str).map_err(|e| TreeSitterError::InvalidQuery {
            message: e.to_string(),
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute the query against parsed source and return all matches.
    pub fn find_all<'a>(&self, parsed: &'a ParsedSource<'a>) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, parsed.root_node(), parsed.source.as_bytes());

        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        byte_start: node.start_byte(),
                        byte_end: node.end_byte(),
                        text: parsed.node_text(node).to_string(),
                        kind: node.kind().to_string(),
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    byte_start: overall_start,
                    byte_end: overall_end,
                    captures,
                });
            }
        }

        results
    }

    /// Byte ranges of every capture named `capture`, in document order.
    pub fn capture_ranges<'a>(
        &self,
        parsed: &'a ParsedSource<'a>,
        capture: &str,
    ) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = self
            .find_all(parsed)
            .into_iter()
            .filter_map(|m| m.captures.get(capture).map(|c| (c.byte_start, c.byte_end)))
            .collect();
        ranges.sort_unstable();
        ranges.dedup();
        ranges
    }
}

/// Common tree-sitter queries for Python constructs.
pub mod queries {
    /// Every identifier token spelled exactly `name`.
    pub fn identifier_named(name: &str) -> String {
        format!(
            r#"((identifier) @id
                (#eq? @id "{name}"))"#
        )
    }

    /// The leading string statement of a module, function body or class body.
    pub const DOCSTRINGS: &str = r#"
(module . (expression_statement (string)) @doc)
(function_definition body: (block . (expression_statement (string)) @doc))
(class_definition body: (block . (expression_statement (string)) @doc))
"#;
}
