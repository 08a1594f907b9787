//! Attraction of candidates to clusters.
//!
//! Every attract function keeps incremental state derived from the current
//! mapping. `Recommendations` feeds it the graph's change events and asks for
//! attraction values of flagged (candidate, cluster) pairs.

mod adc;
mod count;
mod language;
mod naive_bayes;
mod tracker;

pub use adc::AdcAttract;
pub use count::CountAttract;
pub use language::TermExtractor;
pub use naive_bayes::NaiveBayesAttract;
pub use tracker::UpdateTracker;

use crate::config::{AttractConfig, RecommendationSettings};
use crate::error::Result;
use crate::reader::NodeReader;
use reflexion_graph::{
    ChangeType, EdgeIndex, EdgeSnapshot, GraphNode, NodeIndex, ReflexionGraph, State, Subgraph,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Toggle marking nodes generated by analysis tools
pub const IS_ARTIFICIAL: &str = "Element.Is_Artificial";

/// Toggle marking anonymous declarations
pub const IS_ANONYMOUS: &str = "Element.Is_Anonymous";

/// Which nodes are candidates and which are clusters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypes {
    pub candidate_type: String,
    pub cluster_type: String,
}

impl NodeTypes {
    pub fn new(candidate_type: impl Into<String>, cluster_type: impl Into<String>) -> Self {
        Self {
            candidate_type: candidate_type.into(),
            cluster_type: cluster_type.into(),
        }
    }

    pub fn is_candidate(&self, node: &GraphNode) -> bool {
        node.node_type == self.candidate_type
            && node.is_in(Subgraph::Implementation)
            && !node.has_toggle(IS_ARTIFICIAL)
            && !node.has_toggle(IS_ANONYMOUS)
    }

    pub fn is_cluster(&self, node: &GraphNode) -> bool {
        node.node_type == self.cluster_type && node.is_in(Subgraph::Architecture)
    }

    pub fn is_candidate_index(&self, graph: &ReflexionGraph, node: NodeIndex) -> bool {
        graph.node(node).is_some_and(|n| self.is_candidate(n))
    }

    pub fn is_cluster_index(&self, graph: &ReflexionGraph, node: NodeIndex) -> bool {
        graph.node(node).is_some_and(|n| self.is_cluster(n))
    }
}

/// State shared by all attract functions
#[derive(Debug, Clone)]
pub struct AttractBase {
    pub(crate) types: NodeTypes,
    pub(crate) tracker: UpdateTracker,
    edge_weights: BTreeMap<String, f64>,
}

impl AttractBase {
    pub fn new(settings: &RecommendationSettings) -> Self {
        Self {
            types: NodeTypes::new(settings.candidate_type.clone(), settings.cluster_type.clone()),
            tracker: UpdateTracker::new(),
            edge_weights: settings.edge_weights.clone(),
        }
    }

    /// Configured weight of the edge's type, 1.0 if unconfigured
    pub fn edge_weight(&self, graph: &ReflexionGraph, edge: EdgeIndex) -> f64 {
        graph
            .edge(edge)
            .and_then(|e| self.edge_weights.get(&e.edge_type))
            .copied()
            .unwrap_or(1.0)
    }

    pub(crate) fn flag_cluster(&mut self, graph: &ReflexionGraph, cluster: &str) {
        self.tracker.add_cluster_id(graph, &self.types, cluster);
    }

    /// Flag `cluster` and every cluster connected to it by an architecture dependency
    pub(crate) fn flag_cluster_with_neighbors(&mut self, graph: &ReflexionGraph, cluster: &str) {
        let Some(idx) = graph.node_index(cluster) else {
            return;
        };
        self.tracker.add_cluster(graph, &self.types, idx);
        let mut incident = graph.incomings(idx);
        incident.extend(graph.outgoings(idx));
        for edge in incident {
            if let Some(neighbor) = graph.other_endpoint(edge, idx) {
                self.tracker.add_cluster(graph, &self.types, neighbor);
            }
        }
    }

    /// Flag `node` and its ancestors that are unmapped candidates
    pub(crate) fn flag_candidates_containing(&mut self, graph: &ReflexionGraph, node: NodeIndex) {
        for ancestor in graph.ancestors_or_self(node) {
            self.tracker.add_candidate(graph, &self.types, ancestor);
        }
    }

    pub(crate) fn flag_edge_ends(&mut self, graph: &ReflexionGraph, edge: &EdgeSnapshot) {
        self.flag_cluster(graph, &edge.source);
        self.flag_cluster(graph, &edge.target);
    }

    pub(crate) fn mark_all_clusters(&mut self, graph: &ReflexionGraph) {
        self.tracker.mark_all_clusters(graph, &self.types);
    }

    pub(crate) fn mark_all_candidates(&mut self, graph: &ReflexionGraph) {
        self.tracker.mark_all_candidates(graph, &self.types);
    }
}

/// Attract function without any training data
#[derive(Debug, Clone)]
pub struct NoAttract {
    pub(crate) base: AttractBase,
}

impl NoAttract {
    pub fn new(base: AttractBase) -> Self {
        Self { base }
    }

    fn handle_changed_candidate(&mut self, graph: &ReflexionGraph, cluster: &str, node: &str, change: ChangeType) {
        if self.base.tracker.handling_required(node, change) {
            self.base.flag_cluster(graph, cluster);
        }
    }
}

/// The attract function selected by the settings
#[derive(Debug)]
pub enum AttractFunction {
    Count(CountAttract),
    NaiveBayes(NaiveBayesAttract),
    Adc(AdcAttract),
    None(NoAttract),
}

impl AttractFunction {
    pub fn new(settings: &RecommendationSettings, reader: Arc<dyn NodeReader>) -> Self {
        let base = AttractBase::new(settings);
        match &settings.attract {
            AttractConfig::Count(config) => Self::Count(CountAttract::new(base, config)),
            AttractConfig::NaiveBayes(config) => Self::NaiveBayes(NaiveBayesAttract::new(
                base,
                config,
                TermExtractor::new(reader, settings.language, false),
            )),
            AttractConfig::Adc(config) => Self::Adc(AdcAttract::new(
                base,
                config,
                TermExtractor::new(reader, settings.language, config.use_documents_as_set),
            )),
            AttractConfig::None => Self::None(NoAttract::new(base)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::NaiveBayes(_) => "naive_bayes",
            Self::Adc(_) => "adc",
            Self::None(_) => "none",
        }
    }

    fn base(&self) -> &AttractBase {
        match self {
            Self::Count(f) => &f.base,
            Self::NaiveBayes(f) => &f.base,
            Self::Adc(f) => &f.base,
            Self::None(f) => &f.base,
        }
    }

    fn base_mut(&mut self) -> &mut AttractBase {
        match self {
            Self::Count(f) => &mut f.base,
            Self::NaiveBayes(f) => &mut f.base,
            Self::Adc(f) => &mut f.base,
            Self::None(f) => &mut f.base,
        }
    }

    pub fn node_types(&self) -> &NodeTypes {
        &self.base().types
    }

    pub fn tracker(&self) -> &UpdateTracker {
        &self.base().tracker
    }

    pub fn tracker_mut(&mut self) -> &mut UpdateTracker {
        &mut self.base_mut().tracker
    }

    pub fn mark_all_clusters(&mut self, graph: &ReflexionGraph) {
        self.base_mut().mark_all_clusters(graph);
    }

    pub fn mark_all_candidates(&mut self, graph: &ReflexionGraph) {
        self.base_mut().mark_all_candidates(graph);
    }

    /// How strongly `candidate` is attracted to `cluster`; 0 for non-candidates.
    ///
    /// The mapping is the same before and after the call.
    pub fn attraction_value(
        &mut self,
        graph: &mut ReflexionGraph,
        candidate: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<f64> {
        match self {
            Self::Count(f) => f.attraction_value(graph, candidate, cluster),
            Self::NaiveBayes(f) => f.attraction_value(graph, candidate, cluster),
            Self::Adc(f) => f.attraction_value(graph, candidate, cluster),
            Self::None(_) => Ok(0.0),
        }
    }

    /// `node` was explicitly mapped onto or unmapped from `cluster`
    pub fn handle_changed_candidate(
        &mut self,
        graph: &mut ReflexionGraph,
        cluster: &str,
        node: &str,
        change: ChangeType,
    ) -> Result<()> {
        log::debug!("{} attract: {node} {change:?} {cluster}", self.kind());
        match self {
            Self::Count(f) => f.handle_changed_candidate(graph, cluster, node, change),
            Self::NaiveBayes(f) => f.handle_changed_candidate(graph, cluster, node, change),
            Self::Adc(f) => {
                f.handle_changed_candidate(graph, cluster, node, change);
                Ok(())
            }
            Self::None(f) => {
                f.handle_changed_candidate(graph, cluster, node, change);
                Ok(())
            }
        }
    }

    /// An implementation edge changed its state from `old` to `new`
    pub fn handle_changed_state(
        &mut self,
        graph: &mut ReflexionGraph,
        edge: &str,
        old: State,
        new: State,
    ) -> Result<()> {
        match self {
            Self::Adc(f) => f.handle_changed_state(graph, edge, old, new),
            _ => Ok(()),
        }
    }

    pub fn handle_added_cluster(&mut self, graph: &ReflexionGraph, cluster: &str) {
        if let Self::Count(f) = self {
            f.handle_added_cluster(graph, cluster);
            return;
        }
        self.base_mut().flag_cluster(graph, cluster);
    }

    pub fn handle_removed_cluster(&mut self, cluster: &str) -> Result<()> {
        self.base_mut().tracker.remove_cluster(cluster);
        match self {
            Self::NaiveBayes(f) => f.handle_removed_cluster(cluster),
            _ => Ok(()),
        }
    }

    pub fn handle_added_arch_edge(&mut self, graph: &ReflexionGraph, edge: &EdgeSnapshot) {
        log::debug!("{} attract: architecture dependency {} added", self.kind(), edge.id);
        self.clear_state_cache();
        let base = self.base_mut();
        base.flag_edge_ends(graph, edge);
        base.mark_all_candidates(graph);
    }

    pub fn handle_removed_arch_edge(&mut self, graph: &ReflexionGraph, edge: &EdgeSnapshot) -> Result<()> {
        log::debug!("{} attract: architecture dependency {} removed", self.kind(), edge.id);
        self.clear_state_cache();
        if let Self::Adc(f) = self {
            f.handle_removed_arch_edge(graph, edge)?;
        }
        let base = self.base_mut();
        base.flag_edge_ends(graph, edge);
        base.mark_all_candidates(graph);
        Ok(())
    }

    /// Forget all training data
    pub fn reset(&mut self) {
        match self {
            Self::Count(f) => f.reset(),
            Self::NaiveBayes(f) => f.reset(),
            Self::Adc(f) => f.reset(),
            Self::None(f) => f.base.tracker.reset(),
        }
    }

    /// `true` if no mapped node contributes to any attraction value
    pub fn empty_training_data(&self) -> bool {
        match self {
            Self::Count(f) => f.empty_training_data(),
            Self::NaiveBayes(f) => f.empty_training_data(),
            Self::Adc(f) => f.empty_training_data(),
            Self::None(_) => true,
        }
    }

    pub fn dump_training_data(&self) -> String {
        match self {
            Self::Count(f) => f.dump_training_data(),
            Self::NaiveBayes(f) => f.dump_training_data(),
            Self::Adc(f) => f.dump_training_data(),
            Self::None(_) => String::new(),
        }
    }

    pub fn clear_state_cache(&mut self) {
        match self {
            Self::Count(f) => f.clear_state_cache(),
            Self::Adc(f) => f.clear_state_cache(),
            Self::NaiveBayes(_) | Self::None(_) => {}
        }
    }
}
