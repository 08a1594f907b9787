use crate::attract::{AttractFunction, NodeTypes};
use crate::config::RecommendationSettings;
use crate::error::{RecommendError, Result};
use crate::filter::MaxFilter;
use crate::mapping_pair::MappingPair;
use crate::reader::NodeReader;
use reflexion_graph::{ChangeEvent, ChangeType, GraphNode, NodeIndex, ReflexionGraph, State};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Keeps mapping recommendations in sync with a reflexion graph.
///
/// The graph records change events; [`Recommendations::update_recommendations`]
/// drains them, lets the attract function update its training data and
/// recomputes the attraction of flagged (candidate, cluster) pairs.
pub struct Recommendations {
    settings: RecommendationSettings,
    reader: Arc<dyn NodeReader>,
    attract: AttractFunction,
    filter: MaxFilter,
}

impl Recommendations {
    pub fn new(
        graph: &mut ReflexionGraph,
        settings: RecommendationSettings,
        reader: Arc<dyn NodeReader>,
    ) -> Result<Self> {
        settings.validate().map_err(RecommendError::InvalidSettings)?;
        let attract = AttractFunction::new(&settings, Arc::clone(&reader));
        let mut recommendations = Self {
            settings,
            reader,
            attract,
            filter: MaxFilter::new(),
        };
        recommendations.replay(graph)?;
        Ok(recommendations)
    }

    /// Switch to other settings, rebuilding all training data from the graph
    pub fn configure(&mut self, graph: &mut ReflexionGraph, settings: RecommendationSettings) -> Result<()> {
        settings.validate().map_err(RecommendError::InvalidSettings)?;
        self.attract = AttractFunction::new(&settings, Arc::clone(&self.reader));
        self.settings = settings;
        self.filter.reset();
        self.replay(graph)
    }

    /// Train the attract function with the current mapping as if it had been built step by step
    fn replay(&mut self, graph: &mut ReflexionGraph) -> Result<()> {
        let stale = graph.take_events().len();
        if stale > 0 {
            log::debug!("discarding {stale} events recorded before configuration");
        }

        for (node, cluster) in graph.explicit_mappings() {
            let node = graph.node_id(node).to_string();
            let cluster = graph.node_id(cluster).to_string();
            self.attract
                .handle_changed_candidate(graph, &cluster, &node, ChangeType::Addition)?;
        }
        for edge in graph.all_implementation_edges() {
            let state = graph.edge_state(edge);
            if !state.is_allowed() {
                continue;
            }
            let Some(id) = graph.edge(edge).map(|e| e.id.clone()) else {
                continue;
            };
            self.attract
                .handle_changed_state(graph, &id, State::Unmapped, state)?;
        }

        self.attract.mark_all_clusters(graph);
        self.attract.mark_all_candidates(graph);
        self.update_recommendations(graph)?;
        log::info!(
            "Recommendations configured: {} attract, {} candidates, {} clusters",
            self.attract.kind(),
            self.candidates(graph).len(),
            self.clusters(graph).len()
        );
        Ok(())
    }

    /// Dispatch all pending graph events to the attract function
    pub fn process_events(&mut self, graph: &mut ReflexionGraph) -> Result<()> {
        let events = graph.take_events();
        if !events.is_empty() {
            log::debug!("processing {} graph events", events.len());
        }
        for event in events {
            match event {
                ChangeEvent::MapsTo { node, cluster, change } => {
                    self.filter.remove_candidate(&node);
                    self.attract
                        .handle_changed_candidate(graph, &cluster, &node, change)?;
                }
                ChangeEvent::EdgeState { edge, old, new } => {
                    self.attract.handle_changed_state(graph, &edge, old, new)?;
                }
                ChangeEvent::ArchitectureEdge { edge, change } => match change {
                    ChangeType::Addition => self.attract.handle_added_arch_edge(graph, &edge),
                    ChangeType::Removal => self.attract.handle_removed_arch_edge(graph, &edge)?,
                },
                ChangeEvent::ArchitectureNode { node, change } => match change {
                    ChangeType::Addition => self.attract.handle_added_cluster(graph, &node),
                    ChangeType::Removal => {
                        self.attract.handle_removed_cluster(&node)?;
                        self.filter.remove_cluster(&node);
                    }
                },
            }
        }
        Ok(())
    }

    /// Process pending events and recompute the pairs they affect
    pub fn update_recommendations(&mut self, graph: &mut ReflexionGraph) -> Result<()> {
        self.process_events(graph)?;

        let flagged_clusters = self.attract.tracker_mut().take_clusters();
        let flagged_candidates = self.attract.tracker_mut().take_candidates();

        for candidate in self.mapped_candidates(graph) {
            self.filter.remove_candidate(graph.node_id(candidate));
        }
        let stale_clusters: BTreeSet<String> = self
            .filter
            .clusters()
            .filter(|id| !graph.node_index(id).is_some_and(|idx| self.is_cluster_index(graph, idx)))
            .map(str::to_string)
            .collect();
        for cluster in &stale_clusters {
            self.filter.remove_cluster(cluster);
        }

        let unmapped = self.unmapped_candidates(graph);
        let clusters = self.clusters(graph);
        let mut computed: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

        for cluster_id in &flagged_clusters {
            let Some(cluster) = graph.node_index(cluster_id) else {
                self.filter.remove_cluster(cluster_id);
                continue;
            };
            if !self.is_cluster_index(graph, cluster) {
                continue;
            }
            for &candidate in &unmapped {
                self.update_pair(graph, candidate, cluster)?;
                computed.insert((candidate, cluster));
            }
        }

        for candidate_id in &flagged_candidates {
            let Some(candidate) = graph.node_index(candidate_id) else {
                self.filter.remove_candidate(candidate_id);
                continue;
            };
            if !unmapped.contains(&candidate) {
                self.filter.remove_candidate(candidate_id);
                continue;
            }
            for &cluster in &clusters {
                if computed.insert((candidate, cluster)) {
                    self.update_pair(graph, candidate, cluster)?;
                }
            }
        }

        self.filter.refresh();
        log::debug!(
            "updated {} pairs for {} clusters and {} candidates, {} recommendations",
            computed.len(),
            flagged_clusters.len(),
            flagged_candidates.len(),
            self.filter.recommendations().len()
        );
        Ok(())
    }

    fn update_pair(&mut self, graph: &mut ReflexionGraph, candidate: NodeIndex, cluster: NodeIndex) -> Result<()> {
        let value = self.attract.attraction_value(graph, candidate, cluster)?;
        let mut pair = MappingPair::new(graph.node_id(candidate), graph.node_id(cluster));
        pair.set_attraction_value(value)?;
        self.filter.update_mapping_pair(pair);
        Ok(())
    }

    pub fn attraction_value(
        &mut self,
        graph: &mut ReflexionGraph,
        candidate: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<f64> {
        self.attract.attraction_value(graph, candidate, cluster)
    }

    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    pub fn attract_function(&self) -> &AttractFunction {
        &self.attract
    }

    pub fn attract_function_mut(&mut self) -> &mut AttractFunction {
        &mut self.attract
    }

    fn node_types(&self) -> &NodeTypes {
        self.attract.node_types()
    }

    pub fn is_candidate(&self, node: &GraphNode) -> bool {
        self.node_types().is_candidate(node)
    }

    pub fn is_cluster(&self, node: &GraphNode) -> bool {
        self.node_types().is_cluster(node)
    }

    fn is_cluster_index(&self, graph: &ReflexionGraph, node: NodeIndex) -> bool {
        self.node_types().is_cluster_index(graph, node)
    }

    /// All candidates, sorted by id
    pub fn candidates(&self, graph: &ReflexionGraph) -> Vec<NodeIndex> {
        self.sorted_nodes(graph, |node| self.is_candidate(node))
    }

    /// All clusters, sorted by id
    pub fn clusters(&self, graph: &ReflexionGraph) -> Vec<NodeIndex> {
        self.sorted_nodes(graph, |node| self.is_cluster(node))
    }

    pub fn unmapped_candidates(&self, graph: &ReflexionGraph) -> Vec<NodeIndex> {
        self.candidates(graph)
            .into_iter()
            .filter(|&c| graph.maps_to(c).is_none())
            .collect()
    }

    pub fn mapped_candidates(&self, graph: &ReflexionGraph) -> Vec<NodeIndex> {
        self.candidates(graph)
            .into_iter()
            .filter(|&c| graph.maps_to(c).is_some())
            .collect()
    }

    fn sorted_nodes(&self, graph: &ReflexionGraph, keep: impl Fn(&GraphNode) -> bool) -> Vec<NodeIndex> {
        let mut nodes: Vec<(NodeIndex, &str)> = graph
            .nodes()
            .filter(|(_, node)| keep(node))
            .map(|(idx, node)| (idx, node.id.as_str()))
            .collect();
        nodes.sort_by(|a, b| a.1.cmp(b.1));
        nodes.into_iter().map(|(idx, _)| idx).collect()
    }

    /// Pairs within delta of the highest attraction value
    pub fn recommendations(&self) -> Vec<&MappingPair> {
        self.filter.recommendations()
    }

    /// Recommendations involving a candidate or a cluster
    pub fn recommendations_for(&self, graph: &ReflexionGraph, node: NodeIndex) -> Vec<&MappingPair> {
        let Some(data) = graph.node(node) else {
            return Vec::new();
        };
        if self.is_candidate(data) {
            self.filter.recommendations_for_candidate(&data.id)
        } else if self.is_cluster(data) {
            self.filter.recommendations_for_cluster(&data.id)
        } else {
            Vec::new()
        }
    }

    /// Recommendations to apply without asking
    pub fn automatic_mappings(&self) -> Vec<&MappingPair> {
        self.filter.recommendations()
    }

    /// The recommendation if there is exactly one
    pub fn definite_recommendation(&self) -> Option<&MappingPair> {
        match self.filter.recommendations().as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    pub fn mapping_pairs(&self) -> Vec<&MappingPair> {
        self.filter.mapping_pairs().collect()
    }

    pub fn mapping_pair(&self, candidate: &str, cluster: &str) -> Option<&MappingPair> {
        self.filter.mapping_pair(candidate, cluster)
    }

    /// Rank of `candidate` among `pairs` of the expected clusters, by descending attraction.
    ///
    /// 1.0 for the first pair, `1 - index / len` otherwise, rounded to four
    /// places. `None` if the candidate has no such pair.
    pub fn percentile_rank(
        candidate: &str,
        pairs: &[MappingPair],
        expected_clusters: &HashSet<String>,
    ) -> Option<f64> {
        let mut ranked: Vec<&MappingPair> = pairs
            .iter()
            .filter(|pair| expected_clusters.contains(pair.cluster()))
            .collect();
        ranked.sort_by(|a, b| b.cmp(a));
        let index = ranked.iter().position(|pair| pair.candidate() == candidate)?;
        let rank = 1.0 - index as f64 / ranked.len() as f64;
        Some((rank * 10_000.0).round() / 10_000.0)
    }
}

impl std::fmt::Debug for Recommendations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommendations")
            .field("settings", &self.settings)
            .field("attract", &self.attract.kind())
            .field("filter", &self.filter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percentile_rank() {
        let pairs = vec![
            MappingPair::with_value("x", "A", 3.0),
            MappingPair::with_value("y", "A", 2.0),
            MappingPair::with_value("z", "B", 1.0),
            MappingPair::with_value("w", "C", 5.0),
        ];
        let expected: HashSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();

        assert_eq!(Recommendations::percentile_rank("x", &pairs, &expected), Some(1.0));
        assert_eq!(Recommendations::percentile_rank("y", &pairs, &expected), Some(0.6667));
        assert_eq!(Recommendations::percentile_rank("z", &pairs, &expected), Some(0.3333));
        assert_eq!(Recommendations::percentile_rank("w", &pairs, &expected), None);
    }
}
