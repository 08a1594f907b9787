use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language a node's source text is tokenized as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLanguage {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    /// Whitespace/word scanner without a grammar
    #[default]
    Plain,
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "union", "unsafe", "use", "where", "while",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "self", "try", "while", "with", "yield",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "return", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield",
];

const TYPESCRIPT_KEYWORDS: &[&str] = &[
    "abstract", "any", "boolean", "declare", "enum", "implements", "interface", "keyof",
    "namespace", "never", "number", "private", "protected", "public", "readonly", "string",
    "type", "unknown",
];

impl TokenLanguage {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" | "pyw" => Self::Python,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "tsx" | "mts" => Self::TypeScript,
            _ => Self::Plain,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Plain, Self::from_extension)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Plain => "plain",
        }
    }

    /// Tree-sitter grammar, `None` for plain text
    pub fn tree_sitter_language(self) -> Option<tree_sitter::Language> {
        match self {
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Plain => None,
        }
    }

    /// Reserved words that never become terms
    pub fn is_keyword(self, word: &str) -> bool {
        match self {
            Self::Rust => RUST_KEYWORDS.contains(&word),
            Self::Python => PYTHON_KEYWORDS.contains(&word),
            Self::JavaScript => JAVASCRIPT_KEYWORDS.contains(&word),
            Self::TypeScript => {
                JAVASCRIPT_KEYWORDS.contains(&word) || TYPESCRIPT_KEYWORDS.contains(&word)
            }
            Self::Plain => false,
        }
    }
}
