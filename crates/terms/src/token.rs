use crate::error::{Result, TermsError};
use crate::language::TokenLanguage;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};
use unicode_segmentation::UnicodeSegmentation;

/// Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    StringLiteral,
    Comment,
    NumberLiteral,
    Punctuation,
    Whitespace,
    Newline,
    Unknown,
}

/// A slice of source text with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Comment, identifier or string literal
    pub fn carries_words(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Comment | TokenKind::Identifier | TokenKind::StringLiteral
        )
    }
}

/// Split `text` into tokens covering it completely.
///
/// Languages with a grammar are parsed with tree-sitter; everything else goes
/// through a word-boundary scanner.
pub fn tokenize(text: &str, language: TokenLanguage) -> Result<Vec<Token>> {
    let Some(grammar) = language.tree_sitter_language() else {
        return Ok(scan_plain(text));
    };

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| TermsError::tree_sitter(format!("Failed to set language: {e}")))?;
    let tree = parser
        .parse(text, None)
        .ok_or_else(|| TermsError::parse(format!("Failed to parse {} source", language.as_str())))?;

    let mut tokens = Vec::new();
    let mut offset = 0;
    collect_leaves(tree.root_node(), text, &mut offset, &mut tokens);
    push_gap(text, offset, text.len(), &mut tokens);
    Ok(tokens)
}

fn collect_leaves(node: Node, text: &str, offset: &mut usize, tokens: &mut Vec<Token>) {
    let kind = node.kind();
    let whole = if node.is_named() && kind.contains("comment") {
        Some(TokenKind::Comment)
    } else if node.is_named() && is_string_kind(kind) {
        Some(TokenKind::StringLiteral)
    } else if node.child_count() == 0 {
        Some(leaf_kind(node, text))
    } else {
        None
    };

    if let Some(token_kind) = whole {
        let (start, end) = (node.start_byte(), node.end_byte());
        if start < *offset || start == end {
            return;
        }
        push_gap(text, *offset, start, tokens);
        if let Some(slice) = text.get(start..end) {
            tokens.push(Token::new(token_kind, slice));
        }
        *offset = end;
        return;
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    for child in children {
        collect_leaves(child, text, offset, tokens);
    }
}

fn is_string_kind(kind: &str) -> bool {
    matches!(
        kind,
        "string" | "string_literal" | "raw_string_literal" | "char_literal" | "template_string"
    )
}

fn leaf_kind(node: Node, text: &str) -> TokenKind {
    let kind = node.kind();
    let slice = text.get(node.start_byte()..node.end_byte()).unwrap_or("");
    let alphabetic = !slice.is_empty() && slice.chars().all(|c| c.is_alphabetic() || c == '_');

    if node.is_named() {
        if kind.ends_with("identifier") {
            TokenKind::Identifier
        } else if kind.contains("integer") || kind.contains("float") || kind == "number" {
            TokenKind::NumberLiteral
        } else if alphabetic {
            TokenKind::Keyword
        } else {
            TokenKind::Unknown
        }
    } else if alphabetic {
        TokenKind::Keyword
    } else {
        TokenKind::Punctuation
    }
}

/// Emit whitespace between two tokens, one `Newline` per line break
fn push_gap(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    if start >= end {
        return;
    }
    let Some(gap) = text.get(start..end) else {
        return;
    };
    for segment in gap.split_inclusive('\n') {
        let (spaces, newline) = match segment.strip_suffix('\n') {
            Some(rest) => (rest.trim_end_matches('\r'), true),
            None => (segment, false),
        };
        if !spaces.is_empty() {
            tokens.push(Token::new(TokenKind::Whitespace, spaces));
        }
        if newline {
            tokens.push(Token::new(TokenKind::Newline, "\n"));
        }
    }
}

fn scan_plain(text: &str) -> Vec<Token> {
    text.split_word_bounds()
        .map(|segment| {
            let kind = match segment.chars().next() {
                Some('\n' | '\r') => TokenKind::Newline,
                Some(c) if c.is_whitespace() => TokenKind::Whitespace,
                Some(c) if c.is_ascii_digit() => TokenKind::NumberLiteral,
                Some(c) if c.is_alphanumeric() || c == '_' => TokenKind::Identifier,
                Some(_) => TokenKind::Punctuation,
                None => TokenKind::Unknown,
            };
            Token::new(kind, segment)
        })
        .collect()
}
