//! Incremental text classifiers used by the Naive-Bayes attract function

mod naive_bayes;

pub use naive_bayes::{ClassInformation, NaiveBayesIncremental, UNDERFLOW_OFFSET};

use reflexion_terms::Document;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Vocabulary of class {class} would become negative for '{entry}'")]
    NegativeFrequency { class: String, entry: String },
}

/// Classifier trained document by document
pub trait TextClassifier {
    fn add_document(&mut self, class: &str, doc: &Document);

    fn delete_document(&mut self, class: &str, doc: &Document) -> Result<(), ClassifierError>;

    /// Log-space score of `doc` for `class`
    fn probability_for_class(&self, class: &str, doc: &Document) -> f64;

    /// Best scoring class, `None` without trained classes
    fn classify_document(&self, doc: &Document) -> Option<String>;

    fn delete_class(&mut self, class: &str) -> Result<(), ClassifierError>;

    fn is_empty(&self) -> bool;

    fn reset(&mut self);
}
