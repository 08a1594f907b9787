use crate::error::{RecommendError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Attraction values closer than this are considered equal
pub const ATTRACTION_VALUE_DELTA: f64 = 0.001;

/// A candidate, a cluster and how strongly the candidate is attracted to it.
///
/// The attraction value can be set once. Pairs of the same candidate and
/// cluster are equal if their values differ by less than
/// [`ATTRACTION_VALUE_DELTA`]; ordering compares values first.
#[derive(Debug, Clone, Serialize)]
pub struct MappingPair {
    candidate: String,
    cluster: String,
    attraction_value: Option<f64>,
}

impl MappingPair {
    pub fn new(candidate: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            cluster: cluster.into(),
            attraction_value: None,
        }
    }

    pub fn with_value(candidate: impl Into<String>, cluster: impl Into<String>, value: f64) -> Self {
        Self {
            candidate: candidate.into(),
            cluster: cluster.into(),
            attraction_value: Some(value),
        }
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Attraction value, 0 while unset
    pub fn attraction_value(&self) -> f64 {
        self.attraction_value.unwrap_or(0.0)
    }

    pub fn has_attraction_value(&self) -> bool {
        self.attraction_value.is_some()
    }

    pub fn set_attraction_value(&mut self, value: f64) -> Result<()> {
        if self.attraction_value.is_some() {
            return Err(RecommendError::AttractionValueOverwrite {
                candidate: self.candidate.clone(),
                cluster: self.cluster.clone(),
            });
        }
        self.attraction_value = Some(value);
        Ok(())
    }
}

impl PartialEq for MappingPair {
    fn eq(&self, other: &Self) -> bool {
        self.candidate == other.candidate
            && self.cluster == other.cluster
            && (self.attraction_value() - other.attraction_value()).abs() < ATTRACTION_VALUE_DELTA
    }
}

impl Eq for MappingPair {}

impl Hash for MappingPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.candidate.hash(state);
        self.cluster.hash(state);
    }
}

impl PartialOrd for MappingPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MappingPair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.attraction_value()
            .total_cmp(&other.attraction_value())
            .then_with(|| self.candidate.cmp(&other.candidate))
            .then_with(|| self.cluster.cmp(&other.cluster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_is_write_once() {
        let mut pair = MappingPair::new("x", "A");
        assert!(!pair.has_attraction_value());
        pair.set_attraction_value(2.0).unwrap();

        let err = pair.set_attraction_value(3.0).unwrap_err();
        assert!(matches!(err, RecommendError::AttractionValueOverwrite { .. }));
        assert_eq!(pair.attraction_value(), 2.0);
    }

    #[test]
    fn test_equality_within_delta() {
        let a = MappingPair::with_value("x", "A", 1.0);
        let close = MappingPair::with_value("x", "A", 1.0005);
        let far = MappingPair::with_value("x", "A", 1.01);
        let other = MappingPair::with_value("x", "B", 1.0);

        assert_eq!(a, close);
        assert_ne!(a, far);
        assert_ne!(a, other);

        let set: HashSet<MappingPair> = [a, close].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ordering_by_value() {
        let mut pairs = vec![
            MappingPair::with_value("x", "A", 2.0),
            MappingPair::with_value("y", "A", -1.0),
            MappingPair::with_value("z", "B", 5.0),
        ];
        pairs.sort();
        let order: Vec<&str> = pairs.iter().map(MappingPair::candidate).collect();
        assert_eq!(order, vec!["y", "x", "z"]);
    }
}
