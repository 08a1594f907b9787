use super::NodeTypes;
use reflexion_graph::{ChangeType, NodeIndex, ReflexionGraph};
use std::collections::{BTreeSet, HashSet};

/// Bookkeeping of what changed since the last recommendation update
#[derive(Debug, Default, Clone)]
pub struct UpdateTracker {
    handled_candidates: HashSet<String>,
    clusters_to_update: BTreeSet<String>,
    candidates_to_update: BTreeSet<String>,
}

impl UpdateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if a mapping change of `node` still has to be handled.
    ///
    /// An addition is handled once; a removal only after a handled addition.
    pub fn handling_required(&mut self, node: &str, change: ChangeType) -> bool {
        match change {
            ChangeType::Addition => self.handled_candidates.insert(node.to_string()),
            ChangeType::Removal => self.handled_candidates.remove(node),
        }
    }

    /// Flag `cluster` if it is an existing cluster
    pub fn add_cluster(&mut self, graph: &ReflexionGraph, types: &NodeTypes, cluster: NodeIndex) {
        if types.is_cluster_index(graph, cluster) {
            self.clusters_to_update
                .insert(graph.node_id(cluster).to_string());
        }
    }

    pub fn add_cluster_id(&mut self, graph: &ReflexionGraph, types: &NodeTypes, cluster: &str) {
        if let Some(idx) = graph.node_index(cluster) {
            self.add_cluster(graph, types, idx);
        }
    }

    /// Flag `node` if it is an unmapped candidate
    pub fn add_candidate(&mut self, graph: &ReflexionGraph, types: &NodeTypes, node: NodeIndex) {
        if types.is_candidate_index(graph, node) && graph.maps_to(node).is_none() {
            self.candidates_to_update
                .insert(graph.node_id(node).to_string());
        }
    }

    pub fn mark_all_clusters(&mut self, graph: &ReflexionGraph, types: &NodeTypes) {
        let clusters: Vec<String> = graph
            .nodes()
            .filter(|(_, node)| types.is_cluster(node))
            .map(|(_, node)| node.id.clone())
            .collect();
        self.clusters_to_update.extend(clusters);
    }

    pub fn mark_all_candidates(&mut self, graph: &ReflexionGraph, types: &NodeTypes) {
        let candidates: Vec<String> = graph
            .nodes()
            .filter(|(idx, node)| types.is_candidate(node) && graph.maps_to(*idx).is_none())
            .map(|(_, node)| node.id.clone())
            .collect();
        self.candidates_to_update.extend(candidates);
    }

    pub fn remove_cluster(&mut self, cluster: &str) {
        self.clusters_to_update.remove(cluster);
    }

    pub fn remove_candidate(&mut self, candidate: &str) {
        self.candidates_to_update.remove(candidate);
    }

    pub fn clusters_to_update(&self) -> &BTreeSet<String> {
        &self.clusters_to_update
    }

    pub fn candidates_to_update(&self) -> &BTreeSet<String> {
        &self.candidates_to_update
    }

    pub fn handled_candidates(&self) -> &HashSet<String> {
        &self.handled_candidates
    }

    pub fn take_clusters(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.clusters_to_update)
    }

    pub fn take_candidates(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.candidates_to_update)
    }

    /// Forget handled candidates; pending flags are kept
    pub fn reset(&mut self) {
        self.handled_candidates.clear();
    }
}
