use crate::mapping_pair::{MappingPair, ATTRACTION_VALUE_DELTA};
use std::collections::BTreeMap;

/// Keeps the pairs with the highest attraction value.
///
/// A pair is recommended if its value is positive and within
/// [`ATTRACTION_VALUE_DELTA`] of the highest value. Mutations only edit the pair
/// table; call [`MaxFilter::refresh`] afterwards.
#[derive(Debug, Default, Clone)]
pub struct MaxFilter {
    pairs: BTreeMap<(String, String), MappingPair>,
    recommendations: Vec<(String, String)>,
    max_value: f64,
}

impl MaxFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the pair of its candidate and cluster
    pub fn update_mapping_pair(&mut self, pair: MappingPair) {
        let key = (pair.candidate().to_string(), pair.cluster().to_string());
        self.pairs.insert(key, pair);
    }

    pub fn remove_candidate(&mut self, candidate: &str) {
        self.pairs.retain(|(c, _), _| c != candidate);
    }

    pub fn remove_cluster(&mut self, cluster: &str) {
        self.pairs.retain(|(_, k), _| k != cluster);
    }

    pub fn mapping_pair(&self, candidate: &str, cluster: &str) -> Option<&MappingPair> {
        self.pairs.get(&(candidate.to_string(), cluster.to_string()))
    }

    pub fn mapping_pairs(&self) -> impl Iterator<Item = &MappingPair> {
        self.pairs.values()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(|(_, cluster)| cluster.as_str())
    }

    /// Recompute the recommendations from the current pairs
    pub fn refresh(&mut self) {
        self.max_value = self
            .pairs
            .values()
            .map(MappingPair::attraction_value)
            .fold(0.0, f64::max);
        let max = self.max_value;
        self.recommendations = self
            .pairs
            .iter()
            .filter(|(_, pair)| {
                let value = pair.attraction_value();
                value > 0.0 && max - value < ATTRACTION_VALUE_DELTA
            })
            .map(|(key, _)| key.clone())
            .collect();
    }

    /// Highest attraction value, 0 without positive pairs
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn recommendations(&self) -> Vec<&MappingPair> {
        self.recommendations
            .iter()
            .filter_map(|key| self.pairs.get(key))
            .collect()
    }

    pub fn recommendations_for_candidate(&self, candidate: &str) -> Vec<&MappingPair> {
        self.recommendations()
            .into_iter()
            .filter(|pair| pair.candidate() == candidate)
            .collect()
    }

    pub fn recommendations_for_cluster(&self, cluster: &str) -> Vec<&MappingPair> {
        self.recommendations()
            .into_iter()
            .filter(|pair| pair.cluster() == cluster)
            .collect()
    }

    pub fn reset(&mut self) {
        self.pairs.clear();
        self.recommendations.clear();
        self.max_value = 0.0;
    }
}
