use crate::error::{Result, TermsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How two documents are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergingType {
    /// Every word of either document, frequencies added
    #[default]
    Union,
    /// Words present in both documents, smaller frequency
    Intersection,
}

impl MergingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
        }
    }
}

/// Multiset of words.
///
/// Counts never go negative and a word whose count drops to zero is removed.
/// In set view every present word reports a frequency of one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    words: BTreeMap<String, usize>,
    #[serde(default)]
    use_as_set: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from words, one occurrence each
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::new();
        for word in words {
            doc.add_word(word);
        }
        doc
    }

    pub fn add_word(&mut self, word: impl Into<String>) {
        self.add_word_times(word, 1);
    }

    pub fn add_word_times(&mut self, word: impl Into<String>, count: usize) {
        if count == 0 {
            return;
        }
        *self.words.entry(word.into()).or_insert(0) += count;
    }

    pub fn remove_word(&mut self, word: &str) -> Result<()> {
        self.remove_word_times(word, 1)
    }

    /// Remove `count` occurrences; fails without changes if fewer are present
    pub fn remove_word_times(&mut self, word: &str, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let present = self.words.get(word).copied().unwrap_or(0);
        if present < count {
            return Err(TermsError::NegativeFrequency {
                word: word.to_string(),
                present,
                requested: count,
            });
        }
        if present == count {
            self.words.remove(word);
        } else {
            self.words.insert(word.to_string(), present - count);
        }
        Ok(())
    }

    /// Add every occurrence of `other`
    pub fn add_words(&mut self, other: &Document) {
        for (word, &count) in &other.words {
            self.add_word_times(word.clone(), count);
        }
    }

    /// Remove every occurrence of `other`; validated before anything changes
    pub fn remove_words(&mut self, other: &Document) -> Result<()> {
        for (word, &count) in &other.words {
            let present = self.words.get(word).copied().unwrap_or(0);
            if present < count {
                return Err(TermsError::NegativeFrequency {
                    word: word.clone(),
                    present,
                    requested: count,
                });
            }
        }
        for (word, &count) in &other.words {
            self.remove_word_times(word, count)?;
        }
        Ok(())
    }

    pub fn frequency(&self, word: &str) -> usize {
        match self.words.get(word) {
            Some(_) if self.use_as_set => 1,
            Some(&count) => count,
            None => 0,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Combine two documents into a new one
    pub fn merge(a: &Document, b: &Document, mode: MergingType) -> Document {
        let mut merged = Document::new();
        match mode {
            MergingType::Union => {
                for (word, count) in a.frequencies().chain(b.frequencies()) {
                    merged.add_word_times(word, count);
                }
            }
            MergingType::Intersection => {
                for word in a.words().filter(|w| b.contains(w)) {
                    merged.add_word_times(word, a.frequency(word).min(b.frequency(word)));
                }
            }
        }
        merged
    }

    /// Sum of frequency products over shared words
    pub fn dot_product(a: &Document, b: &Document) -> usize {
        a.words()
            .map(|word| a.frequency(word) * b.frequency(word))
            .sum()
    }

    /// Number of distinct words present in both documents
    pub fn common_words(a: &Document, b: &Document) -> usize {
        a.words().filter(|word| b.contains(word)).count()
    }

    /// Shared distinct words relative to the smaller vocabulary, 0 if either is empty
    pub fn overlap_coefficient(a: &Document, b: &Document) -> f64 {
        let smaller = a.word_count().min(b.word_count());
        if smaller == 0 {
            return 0.0;
        }
        Self::common_words(a, b) as f64 / smaller as f64
    }

    /// Distinct words in lexicographic order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    /// Words with their frequencies
    pub fn frequencies(&self) -> impl Iterator<Item = (&str, usize)> {
        self.words().map(move |word| (word, self.frequency(word)))
    }

    /// Every word once per occurrence; call again to start over
    pub fn occurrences(&self) -> impl Iterator<Item = &str> {
        self.frequencies()
            .flat_map(|(word, count)| std::iter::repeat(word).take(count))
    }

    /// Number of distinct words
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Number of occurrences
    pub fn total_count(&self) -> usize {
        self.frequencies().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Switch the set view on or off
    pub fn use_as_set(&mut self, as_set: bool) {
        self.use_as_set = as_set;
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.use_as_set
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (word, count)) in self.frequencies().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{word}: {count}")?;
        }
        f.write_str("]")
    }
}
