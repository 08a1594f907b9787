//! # Reflexion Terms
//!
//! Vocabulary extraction for text-based attraction functions.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     │
//!     ├──> Tokenizer (tree-sitter for Rust/Python/JS/TS, word scanner otherwise)
//!     │
//!     ├──> Word filter: comments, identifiers, string literals minus keywords
//!     │
//!     ├──> Casing split (snake_, kebab-, camelCase)
//!     │
//!     ├──> Snowball English stemmer
//!     │
//!     └──> Document (word multiset: union, intersection, dot product, overlap)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use reflexion_terms::{Document, MergingType, TermPipeline, TokenLanguage};
//!
//! let pipeline = TermPipeline::new();
//! let a = pipeline.document("parseConfig reads the config", TokenLanguage::Plain).unwrap();
//! let b = pipeline.document("config reader", TokenLanguage::Plain).unwrap();
//!
//! let shared = Document::merge(&a, &b, MergingType::Intersection);
//! assert!(shared.contains("config"));
//! ```

mod casing;
mod document;
mod error;
mod language;
mod pipeline;
mod token;

pub use casing::{split_casing, split_words};
pub use document::{Document, MergingType};
pub use error::{Result, TermsError};
pub use language::TokenLanguage;
pub use pipeline::{TermPipeline, MIN_TERM_LENGTH};
pub use token::{tokenize, Token, TokenKind};
