use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("the Python grammar is incompatible with the linked tree-sitter runtime")]
    LanguageSet,

    #[error("tree-sitter returned no tree for the Python source")]
    ParseFailed,

    #[error("invalid Python query: {message}")]
    InvalidQuery { message: String },

    #[error("Python syntax error at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("{count} Python syntax errors")]
    MultipleSyntaxErrors { count: usize },
}
