use crate::casing::{split_casing, split_words};
use crate::document::Document;
use crate::error::Result;
use crate::language::TokenLanguage;
use crate::token::{tokenize, Token};
use rust_stemmers::{Algorithm, Stemmer};
use std::fmt;

/// Terms shorter than this are dropped
pub const MIN_TERM_LENGTH: usize = 4;

/// Turns source text into stemmed, lower-cased terms.
///
/// ```text
/// text ─> tokens ─> comments/identifiers/strings (no keywords)
///      ─> words ─> casing parts ─> lowercase ─> stems ─> len >= 4
/// ```
pub struct TermPipeline {
    stemmer: Stemmer,
}

impl TermPipeline {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Terms of a source text
    pub fn terms(&self, text: &str, language: TokenLanguage) -> Result<Vec<String>> {
        let tokens = tokenize(text, language)?;
        Ok(self.terms_of_tokens(&tokens, language))
    }

    /// Terms of an already tokenized text
    pub fn terms_of_tokens(&self, tokens: &[Token], language: TokenLanguage) -> Vec<String> {
        tokens
            .iter()
            .filter(|token| token.carries_words() && !language.is_keyword(&token.text))
            .flat_map(|token| self.terms_of_words(&token.text))
            .collect()
    }

    /// Terms of free text such as a node name, without tokenizing
    pub fn terms_of_words(&self, text: &str) -> Vec<String> {
        split_words(text)
            .flat_map(split_casing)
            .filter_map(|part| self.normalize(&part))
            .collect()
    }

    /// Document holding the terms of a source text
    pub fn document(&self, text: &str, language: TokenLanguage) -> Result<Document> {
        Ok(Document::from_words(self.terms(text, language)?))
    }

    fn normalize(&self, part: &str) -> Option<String> {
        let lower = part.to_lowercase();
        let stem = self.stemmer.stem(&lower);
        if stem.chars().count() < MIN_TERM_LENGTH {
            return None;
        }
        Some(stem.into_owned())
    }
}

impl Default for TermPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TermPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermPipeline")
            .field("stemmer", &"english")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_words() {
        let pipeline = TermPipeline::new();
        let terms = pipeline.terms("word1 word2 a an the", TokenLanguage::Plain).unwrap();
        assert_eq!(terms, vec!["word1", "word2"]);
    }

    #[test]
    fn test_stemming() {
        let pipeline = TermPipeline::new();
        assert_eq!(pipeline.terms_of_words("implementation"), vec!["implement"]);
        assert_eq!(pipeline.terms_of_words("connections"), vec!["connect"]);
    }

    #[test]
    fn test_keywords_are_skipped() {
        let pipeline = TermPipeline::new();
        let code = "/// Loads settings\npub fn load_settings() -> Settings { Settings::default() }\n";
        let terms = pipeline.terms(code, TokenLanguage::Rust).unwrap();
        assert!(terms.contains(&"load".to_string()));
        assert!(terms.contains(&"default".to_string()));
        assert!(!terms.iter().any(|t| t == "pub"));
    }

    #[test]
    fn test_document_counts_repeats() {
        let pipeline = TermPipeline::new();
        let doc = pipeline.document("word1 word1 word2", TokenLanguage::Plain).unwrap();
        assert_eq!(doc.frequency("word1"), 2);
        assert_eq!(doc.word_count(), 2);
    }
}
