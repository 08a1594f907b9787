use super::{ClassifierError, TextClassifier};
use reflexion_terms::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Added to every log-space score so that scores stay positive
pub const UNDERFLOW_OFFSET: f64 = 10_000.0;

/// Training data of one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassInformation {
    pub words: BTreeMap<String, usize>,
    pub total_words: usize,
    pub document_count: usize,
}

impl ClassInformation {
    pub fn frequency(&self, word: &str) -> usize {
        self.words.get(word).copied().unwrap_or(0)
    }
}

/// Multinomial Naive-Bayes with Laplace smoothing, trained incrementally.
///
/// The global word table always equals the sum of the per-class tables.
#[derive(Debug, Clone)]
pub struct NaiveBayesIncremental {
    alpha: f64,
    classes: BTreeMap<String, ClassInformation>,
    global: BTreeMap<String, usize>,
    document_count: usize,
}

impl NaiveBayesIncremental {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            classes: BTreeMap::new(),
            global: BTreeMap::new(),
            document_count: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Register `class` without training data
    pub fn ensure_class(&mut self, class: &str) {
        self.classes.entry(class.to_string()).or_default();
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn training_data(&self, class: &str) -> Option<&ClassInformation> {
        self.classes.get(class)
    }

    pub fn document_count(&self, class: &str) -> usize {
        self.classes.get(class).map_or(0, |info| info.document_count)
    }

    pub fn total_documents(&self) -> usize {
        self.document_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.global.len()
    }

    pub fn prior_probability(&self, class: &str) -> f64 {
        if self.document_count == 0 {
            return 0.0;
        }
        self.document_count(class) as f64 / self.document_count as f64
    }

    /// Inverse of the log-space score
    pub fn convert_from_logarithmic_scale(value: f64) -> f64 {
        (value - UNDERFLOW_OFFSET).exp()
    }

    /// `true` if the global table equals the sum of all class tables
    pub fn vocabulary_consistent(&self) -> bool {
        let mut summed: BTreeMap<&str, usize> = BTreeMap::new();
        for info in self.classes.values() {
            for (word, &count) in &info.words {
                *summed.entry(word.as_str()).or_insert(0) += count;
            }
        }
        summed.len() == self.global.len()
            && summed
                .iter()
                .all(|(word, count)| self.global.get(*word) == Some(count))
    }

    fn negative(class: &str, entry: &str) -> ClassifierError {
        ClassifierError::NegativeFrequency {
            class: class.to_string(),
            entry: entry.to_string(),
        }
    }
}

impl Default for NaiveBayesIncremental {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TextClassifier for NaiveBayesIncremental {
    fn add_document(&mut self, class: &str, doc: &Document) {
        let info = self.classes.entry(class.to_string()).or_default();
        for (word, frequency) in doc.frequencies() {
            *info.words.entry(word.to_string()).or_insert(0) += frequency;
            *self.global.entry(word.to_string()).or_insert(0) += frequency;
            info.total_words += frequency;
        }
        info.document_count += 1;
        self.document_count += 1;
    }

    fn delete_document(&mut self, class: &str, doc: &Document) -> Result<(), ClassifierError> {
        let info = self
            .classes
            .get(class)
            .ok_or_else(|| ClassifierError::UnknownClass(class.to_string()))?;
        if info.document_count == 0 || self.document_count == 0 {
            return Err(Self::negative(class, "document count"));
        }
        for (word, frequency) in doc.frequencies() {
            let global = self.global.get(word).copied().unwrap_or(0);
            if info.frequency(word) < frequency || global < frequency {
                return Err(Self::negative(class, word));
            }
        }

        let Some(info) = self.classes.get_mut(class) else {
            return Err(ClassifierError::UnknownClass(class.to_string()));
        };
        for (word, frequency) in doc.frequencies() {
            decrement(&mut info.words, word, frequency);
            decrement(&mut self.global, word, frequency);
            info.total_words -= frequency;
        }
        info.document_count -= 1;
        self.document_count -= 1;
        Ok(())
    }

    fn probability_for_class(&self, class: &str, doc: &Document) -> f64 {
        let prior = self.prior_probability(class);
        if prior <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let empty = ClassInformation::default();
        let info = self.classes.get(class).unwrap_or(&empty);

        let unknown = doc.words().filter(|w| !self.global.contains_key(*w)).count();
        let denominator =
            info.total_words as f64 + self.alpha * (self.global.len() + unknown) as f64;

        let mut score = prior.ln();
        for (word, frequency) in doc.frequencies() {
            let likelihood = (self.alpha + info.frequency(word) as f64) / denominator;
            score += frequency as f64 * likelihood.ln();
        }
        score + UNDERFLOW_OFFSET
    }

    fn classify_document(&self, doc: &Document) -> Option<String> {
        let mut best: Option<&str> = None;
        let mut best_score = f64::NEG_INFINITY;
        for class in self.classes.keys() {
            let score = self.probability_for_class(class, doc);
            if score > best_score {
                best_score = score;
                best = Some(class.as_str());
            }
        }
        best.map(str::to_string)
    }

    fn delete_class(&mut self, class: &str) -> Result<(), ClassifierError> {
        let info = self
            .classes
            .get(class)
            .ok_or_else(|| ClassifierError::UnknownClass(class.to_string()))?;
        for (word, &count) in &info.words {
            if self.global.get(word).copied().unwrap_or(0) < count {
                return Err(Self::negative(class, word));
            }
        }
        if self.document_count < info.document_count {
            return Err(Self::negative(class, "document count"));
        }

        let Some(info) = self.classes.remove(class) else {
            return Err(ClassifierError::UnknownClass(class.to_string()));
        };
        for (word, count) in &info.words {
            decrement(&mut self.global, word, *count);
        }
        self.document_count -= info.document_count;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.document_count == 0 && self.global.is_empty()
    }

    fn reset(&mut self) {
        self.classes.clear();
        self.global.clear();
        self.document_count = 0;
    }
}

fn decrement(table: &mut BTreeMap<String, usize>, word: &str, by: usize) {
    if let Some(count) = table.get_mut(word) {
        *count = count.saturating_sub(by);
        if *count == 0 {
            table.remove(word);
        }
    }
}

impl fmt::Display for NaiveBayesIncremental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} documents, {} distinct words",
            self.document_count,
            self.global.len()
        )?;
        for (class, info) in &self.classes {
            let words: Vec<String> = info
                .words
                .iter()
                .map(|(word, count)| format!("{word}: {count}"))
                .collect();
            writeln!(
                f,
                "{class} ({} documents, {} words): [{}]",
                info.document_count,
                info.total_words,
                words.join(", ")
            )?;
        }
        Ok(())
    }
}
