use thiserror::Error;

/// Result type for term operations
pub type Result<T> = std::result::Result<T, TermsError>;

/// Errors that can occur while tokenizing text or editing documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermsError {
    /// Removing more occurrences of a word than a document holds
    #[error("Cannot remove {requested} occurrence(s) of '{word}', only {present} present")]
    NegativeFrequency {
        word: String,
        present: usize,
        requested: usize,
    },

    /// Tree-sitter setup failed
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Failed to parse the source text
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TermsError {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
