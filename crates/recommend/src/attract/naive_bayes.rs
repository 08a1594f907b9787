use super::{AttractBase, TermExtractor};
use crate::classifier::{NaiveBayesIncremental, TextClassifier};
use crate::config::NaiveBayesConfig;
use crate::error::Result;
use reflexion_graph::{ChangeType, NodeIndex, ReflexionGraph};
use reflexion_terms::Document;
use std::collections::HashMap;

/// Classifies candidates with a Naive-Bayes model trained on mapped candidates.
///
/// Every cluster is a class. A mapped candidate contributes one document made
/// of its source terms and, optionally, the cluster dependencies it takes part in.
#[derive(Debug)]
pub struct NaiveBayesAttract {
    pub(crate) base: AttractBase,
    config: NaiveBayesConfig,
    classifier: NaiveBayesIncremental,
    terms: TermExtractor,
    /// Node id -> (cluster id, document it was trained with)
    trained: HashMap<String, (String, Document)>,
}

impl NaiveBayesAttract {
    pub fn new(base: AttractBase, config: &NaiveBayesConfig, terms: TermExtractor) -> Self {
        Self {
            base,
            config: config.clone(),
            classifier: NaiveBayesIncremental::new(config.alpha_smoothing),
            terms,
            trained: HashMap::new(),
        }
    }

    pub fn classifier(&self) -> &NaiveBayesIncremental {
        &self.classifier
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
        let class = graph.node_id(cluster).to_string();
        if self.classifier.document_count(&class) == 0 {
            return Ok(0.0);
        }

        let mut query = Document::new();
        if self.config.use_standard_terms {
            self.terms.add_standard_terms(graph, candidate, &mut query)?;
        }
        // ascendant names only enter queries; training documents stay without them
        self.terms.add_words_of_ascendants(graph, candidate, &mut query);
        if self.config.use_cda {
            let probe = graph.probe_mapping(candidate, cluster)?;
            add_cda_terms(&probe, candidate, &mut query);
        }
        Ok(self.classifier.probability_for_class(&class, &query))
    }

    /// Document a mapped candidate is trained with
    pub fn training_document(&mut self, graph: &ReflexionGraph, node: NodeIndex) -> Result<Document> {
        let mut doc = Document::new();
        if self.config.use_standard_terms {
            self.terms.add_standard_terms(graph, node, &mut doc)?;
        }
        if self.config.use_cda {
            add_cda_terms(graph, node, &mut doc);
        }
        Ok(doc)
    }

    pub fn handle_changed_candidate(
        &mut self,
        graph: &mut ReflexionGraph,
        cluster: &str,
        node: &str,
        change: ChangeType,
    ) -> Result<()> {
        if !self.base.tracker.handling_required(node, change) {
            return Ok(());
        }
        // priors of all classes change with the number of documents
        self.base.mark_all_clusters(graph);

        let Some(idx) = graph.node_index(node) else {
            log::debug!("naive bayes attract: mapped node {node} no longer exists");
            return Ok(());
        };

        if change == ChangeType::Removal {
            self.base.tracker.add_candidate(graph, &self.base.types, idx);
        }
        // nested explicit mappings move their subtree between classes
        for member in graph.post_order_descendants(idx) {
            if self.base.types.is_candidate_index(graph, member) {
                self.retrain(graph, member)?;
            }
        }
        Ok(())
    }

    /// Train `node` under the cluster it is mapped to now, if any
    fn retrain(&mut self, graph: &ReflexionGraph, node: NodeIndex) -> Result<()> {
        let id = graph.node_id(node).to_string();
        let cluster = graph.maps_to(node).map(|c| graph.node_id(c).to_string());
        if self.trained.get(&id).map(|(class, _)| class) == cluster.as_ref() {
            return Ok(());
        }

        if let Some((class, doc)) = self.trained.remove(&id) {
            self.classifier.delete_document(&class, &doc)?;
        }
        match cluster {
            Some(cluster) => {
                let doc = self.training_document(graph, node)?;
                self.classifier.add_document(&cluster, &doc);
                self.trained.insert(id, (cluster, doc));
            }
            None => self.base.tracker.add_candidate(graph, &self.base.types, node),
        }
        Ok(())
    }

    pub fn handle_removed_cluster(&mut self, cluster: &str) -> Result<()> {
        self.trained.retain(|_, entry| entry.0 != cluster);
        if self.classifier.has_class(cluster) {
            self.classifier.delete_class(cluster)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.classifier.reset();
        self.trained.clear();
        self.terms.clear_document_cache();
        self.base.tracker.reset();
    }

    pub fn empty_training_data(&self) -> bool {
        self.classifier.is_empty()
    }

    pub fn dump_training_data(&self) -> String {
        self.classifier.to_string()
    }
}

/// Add `"{source cluster} -{type}- {target cluster}"` for every dependency of
/// `node` with both ends mapped
fn add_cda_terms(graph: &ReflexionGraph, node: NodeIndex, doc: &mut Document) {
    for edge in graph.implementation_edges(node) {
        let (Some((source, target)), Some(data)) = (graph.endpoints(edge), graph.edge(edge)) else {
            continue;
        };
        if let (Some(source_cluster), Some(target_cluster)) = (graph.maps_to(source), graph.maps_to(target)) {
            doc.add_word(format!(
                "{} -{}- {}",
                graph.node_id(source_cluster),
                data.edge_type,
                graph.node_id(target_cluster)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommendationSettings;
    use crate::reader::LookupNodeReader;
    use reflexion_graph::GraphNode;
    use reflexion_terms::TokenLanguage;
    use std::sync::Arc;

    fn attract(config: NaiveBayesConfig, reader: LookupNodeReader) -> NaiveBayesAttract {
        let settings = RecommendationSettings::for_naive_bayes();
        NaiveBayesAttract::new(
            AttractBase::new(&settings),
            &config,
            TermExtractor::new(Arc::new(reader), Some(TokenLanguage::Plain), false),
        )
    }

    #[test]
    fn test_cda_terms_follow_the_probe() {
        let mut graph = ReflexionGraph::new();
        let a = graph.add_node(GraphNode::architecture("A", "Cluster")).unwrap();
        let b = graph.add_node(GraphNode::architecture("B", "Cluster")).unwrap();
        let x = graph.add_node(GraphNode::implementation("x", "Class")).unwrap();
        let y = graph.add_node(GraphNode::implementation("y", "Class")).unwrap();
        graph.add_edge(x, y, "Call").unwrap();
        graph.add_to_mapping(y, b).unwrap();

        let mut doc = Document::new();
        add_cda_terms(&graph, x, &mut doc);
        assert!(doc.is_empty());

        let probe = graph.probe_mapping(x, a).unwrap();
        add_cda_terms(&probe, x, &mut doc);
        assert!(doc.contains("A -Call- B"));
    }

    #[test]
    fn test_training_follows_mapping() {
        let mut graph = ReflexionGraph::new();
        let a = graph.add_node(GraphNode::architecture("A", "Cluster")).unwrap();
        let x = graph.add_node(GraphNode::implementation("x", "Class")).unwrap();
        let y = graph.add_node(GraphNode::implementation("y", "Class")).unwrap();
        let mut nb = attract(
            NaiveBayesConfig::default(),
            LookupNodeReader::new("").with_text("x", "parser").with_text("y", "parser"),
        );

        graph.add_to_mapping(x, a).unwrap();
        nb.handle_changed_candidate(&mut graph, "A", "x", ChangeType::Addition)
            .unwrap();
        assert_eq!(nb.classifier().document_count("A"), 1);
        assert!(nb.attraction_value(&mut graph, y, a).unwrap() > 0.0);
        assert!(nb.base.tracker.clusters_to_update().contains("A"));

        graph.remove_from_mapping(x).unwrap();
        nb.handle_changed_candidate(&mut graph, "A", "x", ChangeType::Removal)
            .unwrap();
        assert!(nb.empty_training_data());
        assert_eq!(nb.attraction_value(&mut graph, y, a).unwrap(), 0.0);
    }
}
