#![allow(dead_code)]

use reflexion_graph::{EdgeSnapshot, GraphNode, NodeIndex, ReflexionGraph, DEFAULT_EDGE_TYPE};
use reflexion_recommend::{
    AttractConfig, LookupNodeReader, MergingType, NaiveBayesIncremental, RecommendationSettings,
    Recommendations, Similarity, TokenLanguage, SOURCE_NAME,
};
use std::sync::Arc;

pub const CANDIDATE: &str = "Candidate";
pub const CLUSTER: &str = "Cluster";

/// Architecture `architecture -> A1..An` and implementation `implementation -> 1..m`.
///
/// Index 0 of `arch` and `imp` is the root; `a(j)` and `i(j)` address the rest.
pub struct Fixture {
    pub graph: ReflexionGraph,
    arch: Vec<NodeIndex>,
    imp: Vec<NodeIndex>,
    recommendations: Option<Recommendations>,
}

impl Fixture {
    pub fn new(clusters: usize, arch_edges: &[(usize, usize)], candidates: usize, impl_edges: &[(usize, usize)]) -> Self {
        let mut graph = ReflexionGraph::new();

        let root = graph
            .add_node(GraphNode::architecture("architecture", "Architecture_Layer"))
            .expect("architecture root");
        let mut arch = vec![root];
        for j in 1..=clusters {
            let cluster = graph
                .add_node(GraphNode::architecture(format!("A{j}"), CLUSTER))
                .expect("cluster");
            graph.set_parent(cluster, root).expect("cluster parent");
            arch.push(cluster);
        }

        let package = graph
            .add_node(GraphNode::implementation("implementation", "Package").with_attribute(SOURCE_NAME, "implementation"))
            .expect("implementation root");
        let mut imp = vec![package];
        for j in 1..=candidates {
            let node = graph
                .add_node(GraphNode::implementation(j.to_string(), CANDIDATE))
                .expect("candidate");
            graph.set_parent(node, package).expect("candidate parent");
            imp.push(node);
        }

        let mut fixture = Self {
            graph,
            arch,
            imp,
            recommendations: None,
        };
        for &(from, to) in arch_edges {
            fixture.graph.add_edge(fixture.a(from), fixture.a(to), DEFAULT_EDGE_TYPE).expect("architecture edge");
        }
        fixture.add_impl_edges(impl_edges, DEFAULT_EDGE_TYPE);
        fixture.graph.clear_events();
        fixture
    }

    pub fn add_impl_edges(&mut self, edges: &[(usize, usize)], edge_type: &str) {
        for &(from, to) in edges {
            self.graph.add_edge(self.i(from), self.i(to), edge_type).expect("implementation edge");
        }
    }

    /// Move implementation nodes below other implementation nodes
    pub fn with_hierarchy(mut self, child_parent: &[(usize, usize)]) -> Self {
        for &(child, parent) in child_parent {
            self.graph.set_parent(self.i(child), self.i(parent)).expect("hierarchy");
        }
        self
    }

    pub fn a(&self, j: usize) -> NodeIndex {
        self.arch[j]
    }

    pub fn i(&self, j: usize) -> NodeIndex {
        self.imp[j]
    }

    /// First call installs `reader`, later calls keep it and only switch settings
    pub fn configure(&mut self, settings: RecommendationSettings, reader: LookupNodeReader) {
        if let Some(recommendations) = self.recommendations.as_mut() {
            recommendations
                .configure(&mut self.graph, settings)
                .expect("reconfigure recommendations");
            return;
        }
        let recommendations =
            Recommendations::new(&mut self.graph, settings, Arc::new(reader)).expect("recommendations");
        self.recommendations = Some(recommendations);
    }

    pub fn recommendations(&self) -> &Recommendations {
        self.recommendations.as_ref().expect("configured")
    }

    /// Hand the recommendations to code that drives the graph itself
    pub fn take_recommendations(&mut self) -> Recommendations {
        self.recommendations.take().expect("configured")
    }

    pub fn update(&mut self) {
        self.recommendations
            .as_mut()
            .expect("configured")
            .update_recommendations(&mut self.graph)
            .expect("update recommendations");
    }

    pub fn map(&mut self, node: usize, cluster: usize) {
        self.graph.add_to_mapping(self.i(node), self.a(cluster)).expect("map");
        self.update();
    }

    pub fn unmap(&mut self, node: usize) {
        self.graph.remove_from_mapping(self.i(node)).expect("unmap");
        self.update();
    }

    /// Map without processing the resulting events
    pub fn stage_map(&mut self, node: usize, cluster: usize) {
        self.graph.add_to_mapping(self.i(node), self.a(cluster)).expect("map");
    }

    pub fn stage_unmap(&mut self, node: usize) {
        self.graph.remove_from_mapping(self.i(node)).expect("unmap");
    }

    pub fn remove_architecture_edges(&mut self) -> Vec<EdgeSnapshot> {
        let mut removed = Vec::new();
        for edge in self.graph.architecture_edges() {
            removed.push(self.graph.remove_edge(edge).expect("remove edge"));
        }
        self.update();
        removed
    }

    pub fn restore_edges(&mut self, edges: &[EdgeSnapshot]) {
        for edge in edges {
            let source = self.graph.node_index(&edge.source).expect("source");
            let target = self.graph.node_index(&edge.target).expect("target");
            self.graph
                .add_edge_with_id(edge.id.clone(), source, target, edge.edge_type.clone())
                .expect("restore edge");
        }
        self.update();
    }

    pub fn attraction(&mut self, node: usize, cluster: usize) -> f64 {
        let (candidate, cluster) = (self.i(node), self.a(cluster));
        self.recommendations
            .as_mut()
            .expect("configured")
            .attraction_value(&mut self.graph, candidate, cluster)
            .expect("attraction value")
    }

    /// Naive-Bayes scores back in linear scale
    pub fn probability(&mut self, node: usize, cluster: usize) -> f64 {
        NaiveBayesIncremental::convert_from_logarithmic_scale(self.attraction(node, cluster))
    }

    pub fn empty_training_data(&self) -> bool {
        self.recommendations().attract_function().empty_training_data()
    }

    /// (candidate, cluster) ids of all recommendations involving a node
    pub fn recommended_for(&self, node: NodeIndex) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .recommendations()
            .recommendations_for(&self.graph, node)
            .into_iter()
            .map(|pair| (pair.candidate().to_string(), pair.cluster().to_string()))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn recommended(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .recommendations()
            .recommendations()
            .into_iter()
            .map(|pair| (pair.candidate().to_string(), pair.cluster().to_string()))
            .collect();
        pairs.sort();
        pairs
    }
}

pub fn pair(candidate: &str, cluster: &str) -> (String, String) {
    (candidate.to_string(), cluster.to_string())
}

pub fn count_settings(phi: f64) -> RecommendationSettings {
    RecommendationSettings::for_count(phi).with_node_types(CANDIDATE, CLUSTER)
}

pub fn naive_bayes_settings() -> RecommendationSettings {
    let mut settings = RecommendationSettings::for_naive_bayes().with_node_types(CANDIDATE, CLUSTER);
    settings.language = Some(TokenLanguage::Plain);
    settings
}

/// ADC with overlap similarity, so every matching dependency adds at most 1
pub fn adc_settings(merging_type: MergingType) -> RecommendationSettings {
    let mut settings = RecommendationSettings::for_adc(merging_type).with_node_types(CANDIDATE, CLUSTER);
    if let AttractConfig::Adc(config) = &mut settings.attract {
        config.similarity = Similarity::Overlap;
    }
    settings.language = Some(TokenLanguage::Plain);
    settings
}

/// Every node reads "word1" unless given other text
pub fn reader(texts: &[(usize, &str)]) -> LookupNodeReader {
    texts
        .iter()
        .fold(LookupNodeReader::new("word1"), |reader, (node, text)| reader.with_text(node.to_string(), *text))
}
