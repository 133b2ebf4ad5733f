//! Python-specific vocabulary: node kinds, keywords and builtins.

/// Python node kinds used by the extractor and the renamer.
pub mod node_kinds {
    pub const MODULE: &str = "module";
    pub const BLOCK: &str = "block";
    pub const FUNCTION_DEF: &str = "function_definition";
    pub const CLASS_DEF: &str = "class_definition";
    pub const DECORATED_DEF: &str = "decorated_definition";
    pub const PARAMETERS: &str = "parameters";
    pub const IDENTIFIER: &str = "identifier";
    pub const TYPED_PARAMETER: &str = "typed_parameter";
    pub const DEFAULT_PARAMETER: &str = "default_parameter";
    pub const TYPED_DEFAULT_PARAMETER: &str = "typed_default_parameter";
    pub const LIST_SPLAT_PATTERN: &str = "list_splat_pattern";
    pub const DICTIONARY_SPLAT_PATTERN: &str = "dictionary_splat_pattern";
    pub const KEYWORD_SEPARATOR: &str = "keyword_separator";
    pub const POSITIONAL_SEPARATOR: &str = "positional_separator";
    pub const EXPRESSION_STATEMENT: &str = "expression_statement";
    pub const ASSIGNMENT: &str = "assignment";
    pub const PATTERN_LIST: &str = "pattern_list";
    pub const TUPLE_PATTERN: &str = "tuple_pattern";
    pub const LIST_PATTERN: &str = "list_pattern";
    pub const FOR_STATEMENT: &str = "for_statement";
    pub const WHILE_STATEMENT: &str = "while_statement";
    pub const IF_STATEMENT: &str = "if_statement";
    pub const ELIF_CLAUSE: &str = "elif_clause";
    pub const ELSE_CLAUSE: &str = "else_clause";
    pub const TRY_STATEMENT: &str = "try_statement";
    pub const EXCEPT_CLAUSE: &str = "except_clause";
    pub const EXCEPT_GROUP_CLAUSE: &str = "except_group_clause";
    pub const FINALLY_CLAUSE: &str = "finally_clause";
    pub const WITH_STATEMENT: &str = "with_statement";
    pub const WITH_CLAUSE: &str = "with_clause";
    pub const WITH_ITEM: &str = "with_item";
    pub const AS_PATTERN: &str = "as_pattern";
    pub const AS_PATTERN_TARGET: &str = "as_pattern_target";
    pub const COMMENT: &str = "comment";
    pub const STRING: &str = "string";
    pub const INTERPOLATION: &str = "interpolation";
    pub const IMPORT_STATEMENT: &str = "import_statement";
    pub const IMPORT_FROM_STATEMENT: &str = "import_from_statement";
    pub const DOTTED_NAME: &str = "dotted_name";
    pub const ALIASED_IMPORT: &str = "aliased_import";
    pub const RELATIVE_IMPORT: &str = "relative_import";
    pub const ATTRIBUTE: &str = "attribute";
    pub const KEYWORD_ARGUMENT: &str = "keyword_argument";
    pub const CALL: &str = "call";
    pub const AUGMENTED_ASSIGNMENT: &str = "augmented_assignment";
    pub const PASS_STATEMENT: &str = "pass_statement";
    pub const BREAK_STATEMENT: &str = "break_statement";
    pub const CONTINUE_STATEMENT: &str = "continue_statement";
    pub const GLOBAL_STATEMENT: &str = "global_statement";
    pub const NONLOCAL_STATEMENT: &str = "nonlocal_statement";
    pub const RETURN_STATEMENT: &str = "return_statement";
    pub const NAMED_EXPRESSION: &str = "named_expression";
    pub const LAMBDA: &str = "lambda";
    pub const LIST_COMPREHENSION: &str = "list_comprehension";
    pub const SET_COMPREHENSION: &str = "set_comprehension";
    pub const DICTIONARY_COMPREHENSION: &str = "dictionary_comprehension";
    pub const GENERATOR_EXPRESSION: &str = "generator_expression";
}

/// Hard keywords of Python 3.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Soft keywords: legal identifiers, but confusing targets for generated names.
pub const SOFT_KEYWORDS: &[&str] = &["_", "case", "match", "type"];

/// Names bound in the `builtins` module.
pub const BUILTINS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "copyright", "credits",
    "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "exit", "filter", "float",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id",
    "input", "int", "isinstance", "issubclass", "iter", "len", "license", "list", "locals",
    "map", "max", "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
    "property", "quit", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
    "__import__", "NotImplemented", "Ellipsis", "BaseException", "Exception",
    "ArithmeticError", "AssertionError", "AttributeError", "EOFError", "ImportError",
    "IndexError", "KeyError", "KeyboardInterrupt", "LookupError", "NameError",
    "NotImplementedError", "OSError", "OverflowError", "RecursionError", "RuntimeError",
    "StopIteration", "StopAsyncIteration", "SyntaxError", "SystemExit", "TypeError",
    "ValueError", "ZeroDivisionError", "FileNotFoundError", "PermissionError", "IOError",
    "UnicodeError", "UnicodeDecodeError", "UnicodeEncodeError", "Warning",
    "DeprecationWarning", "UserWarning", "GeneratorExit",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name) || SOFT_KEYWORDS.contains(&name)
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// `__name__`-style names carry interpreter meaning and are never renamed.
pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// Whether `name` is a syntactically valid Python identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_soft_keywords() {
        assert!(is_keyword("def"));
        assert!(is_keyword("as"));
        assert!(is_keyword("match"));
        assert!(!is_keyword("foo"));
    }

    #[test]
    fn dunder_detection() {
        assert!(is_dunder("__init__"));
        assert!(!is_dunder("__"));
        assert!(!is_dunder("____"));
        assert!(!is_dunder("_private"));
        assert!(!is_dunder("__mangled"));
    }

    #[test]
    fn identifier_validation() {
        assert!(is_identifier("foo"));
        assert!(is_identifier("_x1"));
        assert!(is_identifier("café"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("my-module"));
        assert!(!is_identifier(""));
    }
}
