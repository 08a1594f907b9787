use super::{AttractBase, TermExtractor};
use crate::config::{AdcConfig, AmbiguityPolicy, Similarity};
use crate::edge_state_cache::EdgeStateCache;
use crate::error::{RecommendError, Result};
use reflexion_graph::{ChangeType, EdgeIndex, EdgeSnapshot, NodeIndex, ReflexionGraph, State};
use reflexion_terms::Document;
use std::collections::{BTreeMap, HashMap};

/// Architecture dependency an allowed implementation dependency was added to
#[derive(Debug, Clone)]
struct Specification {
    key: String,
    source_cluster: String,
    target_cluster: String,
    document: Document,
}

/// Architecture dependency classification.
///
/// Every architecture dependency collects the merged terms of the implementation
/// dependencies it allows. Dependencies implicitly allowed inside a cluster or
/// towards an enclosing cluster are collected under a synthetic key
/// `source-type->target`. A candidate is attracted to a cluster as far as its
/// dependencies, mapped hypothetically, resemble what the allowing
/// architecture dependencies already collected.
#[derive(Debug)]
pub struct AdcAttract {
    pub(crate) base: AttractBase,
    config: AdcConfig,
    terms: TermExtractor,
    cache: EdgeStateCache,
    words_per_dependency: BTreeMap<String, Document>,
    /// Implementation edge id -> specification
    specified_by: HashMap<String, Specification>,
}

impl AdcAttract {
    pub fn new(base: AttractBase, config: &AdcConfig, terms: TermExtractor) -> Self {
        Self {
            base,
            config: config.clone(),
            terms,
            cache: EdgeStateCache::new(),
            words_per_dependency: BTreeMap::new(),
            specified_by: HashMap::new(),
        }
    }

    /// Terms collected for an architecture dependency key
    pub fn dependency_document(&self, key: &str) -> Option<&Document> {
        self.words_per_dependency.get(key)
    }

    pub fn attraction_value(
        &mut self,
        graph: &mut ReflexionGraph,
        candidate: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<f64> {
        if !self.base.types.is_candidate_index(graph, candidate) {
            return Ok(0.0);
        }

        let mut attraction = 0.0;
        for node in graph.post_order_descendants(candidate) {
            for edge in graph.implementation_edges(node) {
                let Some((source, target)) = graph.endpoints(edge) else {
                    continue;
                };
                let outgoing = source == node;
                let neighbor = if outgoing { target } else { source };

                let state = self.cache.get(graph, cluster, candidate, neighbor, edge)?;
                if !state.is_allowed() {
                    continue;
                }
                let Some(neighbor_cluster) = graph.maps_to(neighbor) else {
                    continue;
                };
                let (source_cluster, target_cluster) = if outgoing {
                    (cluster, neighbor_cluster)
                } else {
                    (neighbor_cluster, cluster)
                };

                let Some(key) =
                    self.dependency_key(graph, source_cluster, target_cluster, state, edge)?
                else {
                    continue;
                };
                let Some(collected) = self.words_per_dependency.get(&key) else {
                    continue;
                };
                let merged = self
                    .terms
                    .merged_terms(graph, source, target, self.config.merging_type)?;
                attraction += self.similarity(&merged, collected);
            }
        }
        Ok(attraction)
    }

    fn similarity(&self, a: &Document, b: &Document) -> f64 {
        match self.config.similarity {
            Similarity::DotProduct => Document::dot_product(a, b) as f64,
            Similarity::Overlap => Document::overlap_coefficient(a, b),
        }
    }

    /// Key of the architecture dependency allowing `source_cluster -> target_cluster`
    fn dependency_key(
        &self,
        graph: &ReflexionGraph,
        source_cluster: NodeIndex,
        target_cluster: NodeIndex,
        state: State,
        edge: EdgeIndex,
    ) -> Result<Option<String>> {
        match state {
            State::Allowed => {
                let dependencies = graph.specifying_dependencies(source_cluster, target_cluster);
                if dependencies.len() > 1
                    && self.config.ambiguity == AmbiguityPolicy::ErrorOnAmbiguity
                {
                    return Err(RecommendError::AmbiguousArchitectureDependency {
                        source_cluster: graph.node_id(source_cluster).to_string(),
                        target_cluster: graph.node_id(target_cluster).to_string(),
                        count: dependencies.len(),
                    });
                }
                let key = dependencies
                    .first()
                    .and_then(|&dependency| graph.edge(dependency))
                    .map(|dependency| dependency.id.clone());
                if key.is_none() {
                    log::warn!(
                        "no architecture dependency allows {} -> {}",
                        graph.node_id(source_cluster),
                        graph.node_id(target_cluster)
                    );
                }
                Ok(key)
            }
            State::ImplicitlyAllowed => {
                let edge_type = graph.edge(edge).map_or("", |e| e.edge_type.as_str());
                Ok(Some(format!(
                    "{}-{}->{}",
                    graph.node_id(source_cluster),
                    edge_type,
                    graph.node_id(target_cluster)
                )))
            }
            _ => Ok(None),
        }
    }

    pub fn handle_changed_candidate(
        &mut self,
        graph: &ReflexionGraph,
        cluster: &str,
        node: &str,
        change: ChangeType,
    ) {
        if self.base.tracker.handling_required(node, change) {
            self.base.flag_cluster(graph, cluster);
        }
    }

    pub fn handle_changed_state(
        &mut self,
        graph: &mut ReflexionGraph,
        edge: &str,
        old: State,
        new: State,
    ) -> Result<()> {
        match (old.is_allowed(), new.is_allowed()) {
            (false, true) => self.add_dependency_terms(graph, edge),
            (true, false) => self.remove_dependency_terms(graph, edge),
            // the allowing dependency may have changed
            (true, true) => {
                self.remove_dependency_terms(graph, edge)?;
                self.add_dependency_terms(graph, edge)
            }
            (false, false) => Ok(()),
        }
    }

    /// Collect the terms of an allowed implementation dependency
    fn add_dependency_terms(&mut self, graph: &ReflexionGraph, edge_id: &str) -> Result<()> {
        if self.specified_by.contains_key(edge_id) {
            return Ok(());
        }
        let Some(edge) = graph.edge_index(edge_id) else {
            return Ok(());
        };
        let state = graph.edge_state(edge);
        if !state.is_allowed() {
            return Ok(());
        }
        let Some((source, target)) = graph.endpoints(edge) else {
            return Ok(());
        };
        let (Some(source_cluster), Some(target_cluster)) = (graph.maps_to(source), graph.maps_to(target))
        else {
            return Ok(());
        };

        let source_id = graph.node_id(source_cluster).to_string();
        let target_id = graph.node_id(target_cluster).to_string();
        self.base.flag_cluster(graph, &source_id);
        self.base.flag_cluster(graph, &target_id);

        let Some(key) = self.dependency_key(graph, source_cluster, target_cluster, state, edge)? else {
            return Ok(());
        };
        let merged = self
            .terms
            .merged_terms(graph, source, target, self.config.merging_type)?;

        let use_as_set = self.config.use_documents_as_set;
        self.words_per_dependency
            .entry(key.clone())
            .or_insert_with(|| {
                let mut doc = Document::new();
                doc.use_as_set(use_as_set);
                doc
            })
            .add_words(&merged);
        log::trace!("adc attract: {edge_id} adds {} terms to {key}", merged.word_count());
        self.specified_by.insert(
            edge_id.to_string(),
            Specification {
                key,
                source_cluster: source_id,
                target_cluster: target_id,
                document: merged,
            },
        );
        Ok(())
    }

    fn remove_dependency_terms(&mut self, graph: &ReflexionGraph, edge_id: &str) -> Result<()> {
        let Some(specification) = self.specified_by.remove(edge_id) else {
            return Ok(());
        };
        if let Some(collected) = self.words_per_dependency.get_mut(&specification.key) {
            collected.remove_words(&specification.document)?;
        }
        self.base.flag_cluster(graph, &specification.source_cluster);
        self.base.flag_cluster(graph, &specification.target_cluster);
        Ok(())
    }

    /// Drop everything collected for a removed architecture dependency.
    ///
    /// Implementation dependencies still allowed by another architecture
    /// dependency are collected again under that one.
    pub fn handle_removed_arch_edge(&mut self, graph: &ReflexionGraph, edge: &EdgeSnapshot) -> Result<()> {
        let orphaned: Vec<String> = self
            .specified_by
            .iter()
            .filter(|(_, specification)| specification.key == edge.id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &orphaned {
            self.specified_by.remove(id);
        }
        self.words_per_dependency.remove(&edge.id);
        for id in orphaned {
            self.add_dependency_terms(graph, &id)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.cache.clear_cache();
        self.terms.clear_document_cache();
        self.words_per_dependency.clear();
        self.specified_by.clear();
        self.base.tracker.reset();
    }

    pub fn empty_training_data(&self) -> bool {
        self.words_per_dependency.values().all(Document::is_empty)
    }

    pub fn dump_training_data(&self) -> String {
        let mut out = String::new();
        for (key, doc) in &self.words_per_dependency {
            out.push_str(&format!("{key}: {doc}\n"));
        }
        out
    }

    pub fn clear_state_cache(&mut self) {
        self.cache.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommendationSettings;
    use crate::reader::LookupNodeReader;
    use pretty_assertions::assert_eq;
    use reflexion_graph::GraphNode;
    use reflexion_terms::{MergingType, TokenLanguage};
    use std::sync::Arc;

    fn attract(config: AdcConfig) -> AdcAttract {
        let settings = RecommendationSettings::for_adc(config.merging_type);
        let reader = LookupNodeReader::new("")
            .with_text("x", "parser config")
            .with_text("y", "config loader")
            .with_text("z", "config parser");
        AdcAttract::new(
            AttractBase::new(&settings),
            &config,
            TermExtractor::new(Arc::new(reader), Some(TokenLanguage::Plain), false),
        )
    }

    struct Setup {
        graph: ReflexionGraph,
        a: NodeIndex,
        b: NodeIndex,
        z: NodeIndex,
        allowed: String,
    }

    /// A -> B with x (in A) -> y (in B), and z unmapped with z -> y
    fn setup() -> Setup {
        let mut graph = ReflexionGraph::new();
        let a = graph.add_node(GraphNode::architecture("A", "Cluster")).unwrap();
        let b = graph.add_node(GraphNode::architecture("B", "Cluster")).unwrap();
        graph.add_edge_with_id("A-B", a, b, "Source_Dependency").unwrap();
        let x = graph.add_node(GraphNode::implementation("x", "Class")).unwrap();
        let y = graph.add_node(GraphNode::implementation("y", "Class")).unwrap();
        let z = graph.add_node(GraphNode::implementation("z", "Class")).unwrap();
        let allowed = graph.add_edge(x, y, "Call").unwrap();
        graph.add_edge(z, y, "Call").unwrap();
        graph.add_to_mapping(x, a).unwrap();
        graph.add_to_mapping(y, b).unwrap();
        graph.clear_events();
        let allowed = graph.edge(allowed).unwrap().id.clone();
        Setup { graph, a, b, z, allowed }
    }

    #[test]
    fn test_allowed_dependency_collects_terms() {
        let Setup { mut graph, a, b, z, allowed } = setup();
        let mut adc = attract(AdcConfig::default());

        adc.handle_changed_state(&mut graph, &allowed, State::Unmapped, State::Allowed)
            .unwrap();
        let collected = adc.dependency_document("A-B").unwrap();
        assert_eq!(collected.frequency("config"), 2);
        assert_eq!(collected.word_count(), 3);

        // z -> y merged: {config: 2, parser: 1, loader: 1}
        assert_eq!(adc.attraction_value(&mut graph, z, a).unwrap(), 6.0);
        // z -> y inside B is implicitly allowed, nothing collected for it
        assert_eq!(adc.attraction_value(&mut graph, z, b).unwrap(), 0.0);
        assert_eq!(graph.maps_to(z), None);
    }

    #[test]
    fn test_leaving_allowed_state_removes_terms() {
        let Setup { mut graph, allowed, .. } = setup();
        let mut adc = attract(AdcConfig {
            merging_type: MergingType::Intersection,
            ..Default::default()
        });
        adc.handle_changed_state(&mut graph, &allowed, State::Unmapped, State::Allowed)
            .unwrap();
        assert!(!adc.empty_training_data());

        let x = graph.node_index("x").unwrap();
        graph.remove_from_mapping(x).unwrap();
        adc.handle_changed_state(&mut graph, &allowed, State::Allowed, State::Unmapped)
            .unwrap();
        assert!(adc.empty_training_data());
    }

    #[test]
    fn test_removed_architecture_dependency_drops_terms() {
        let Setup { mut graph, allowed, .. } = setup();
        let mut adc = attract(AdcConfig::default());
        adc.handle_changed_state(&mut graph, &allowed, State::Unmapped, State::Allowed)
            .unwrap();

        let edge = graph.edge_index("A-B").unwrap();
        let snapshot = graph.remove_edge(edge).unwrap();
        adc.handle_removed_arch_edge(&graph, &snapshot).unwrap();

        assert!(adc.dependency_document("A-B").is_none());
        assert!(adc.empty_training_data());
    }

    #[test]
    fn test_ambiguous_dependency() {
        let Setup { mut graph, a, b, z, allowed } = setup();
        let outer = graph.add_node(GraphNode::architecture("Outer", "Cluster")).unwrap();
        graph.set_parent(b, outer).unwrap();
        graph.add_edge_with_id("A-Outer", a, outer, "Source_Dependency").unwrap();

        let mut adc = attract(AdcConfig {
            ambiguity: AmbiguityPolicy::ErrorOnAmbiguity,
            ..Default::default()
        });
        let err = adc
            .handle_changed_state(&mut graph, &allowed, State::Unmapped, State::Allowed)
            .unwrap_err();
        assert!(matches!(err, RecommendError::AmbiguousArchitectureDependency { count: 2, .. }));

        let mut adc = attract(AdcConfig::default());
        adc.handle_changed_state(&mut graph, &allowed, State::Unmapped, State::Allowed)
            .unwrap();
        assert!(adc.dependency_document("A-B").is_some());
        assert!(adc.attraction_value(&mut graph, z, a).unwrap() > 0.0);
    }
}
