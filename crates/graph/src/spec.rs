use crate::error::{GraphError, Result};
use crate::types::{GraphNode, ReflexionGraph, Subgraph, DEFAULT_EDGE_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Serializable description of a reflexion graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default = "default_true")]
    pub allow_dependencies_to_parents: bool,

    pub nodes: Vec<NodeSpec>,

    #[serde(default)]
    pub edges: Vec<EdgeSpec>,

    /// Explicit mapping (implementation node -> cluster)
    #[serde(default)]
    pub mapping: Vec<MappingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: String,

    pub subgraph: Subgraph,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub int_attributes: BTreeMap<String, i64>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub toggles: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub source: String,

    pub target: String,

    #[serde(rename = "type", default = "default_edge_type")]
    pub edge_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSpec {
    pub node: String,
    pub cluster: String,
}

fn default_true() -> bool {
    true
}

fn default_edge_type() -> String {
    DEFAULT_EDGE_TYPE.to_string()
}

impl ReflexionGraph {
    /// Build a graph from its description.
    ///
    /// The initial mapping is applied silently and no events are pending
    /// afterwards.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self> {
        let mut graph = Self::new();
        graph.set_allow_dependencies_to_parents(spec.allow_dependencies_to_parents);

        for node in &spec.nodes {
            let mut data = GraphNode::new(node.id.clone(), node.node_type.clone(), node.subgraph);
            data.string_attributes = node.attributes.clone();
            data.int_attributes = node.int_attributes.clone();
            data.toggles = node.toggles.clone();
            graph.add_node(data)?;
        }

        for node in &spec.nodes {
            if let Some(parent) = &node.parent {
                let child = graph.require_node(&node.id)?;
                let parent = graph.require_node(parent)?;
                graph.set_parent(child, parent)?;
            }
        }

        for edge in &spec.edges {
            let source = graph.require_node(&edge.source)?;
            let target = graph.require_node(&edge.target)?;
            match &edge.id {
                Some(id) => graph.add_edge_with_id(id.clone(), source, target, edge.edge_type.clone())?,
                None => graph.add_edge(source, target, edge.edge_type.clone())?,
            };
        }

        for entry in &spec.mapping {
            let node = graph.require_node(&entry.node)?;
            let cluster = graph.require_node(&entry.cluster)?;
            graph.add_to_mapping_silently(node, cluster)?;
        }

        graph.clear_events();
        log::info!(
            "Loaded reflexion graph: {} nodes, {} edges, {} mapped",
            graph.node_count(),
            graph.edge_count(),
            spec.mapping.len()
        );
        Ok(graph)
    }

    /// Parse a JSON graph description
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: GraphSpec = serde_json::from_str(json)?;
        Self::from_spec(&spec)
    }

    /// Describe the current graph, including its explicit mapping
    pub fn to_spec(&self) -> GraphSpec {
        let mut nodes: Vec<NodeSpec> = self
            .nodes()
            .map(|(_, node)| NodeSpec {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                subgraph: node.subgraph,
                parent: node.parent().map(|p| self.node_id(p).to_string()),
                attributes: node.string_attributes.clone(),
                int_attributes: node.int_attributes.clone(),
                toggles: node.toggles.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeSpec> = self
            .edges()
            .filter_map(|(idx, _)| self.snapshot(idx))
            .map(|snapshot| EdgeSpec {
                id: Some(snapshot.id),
                source: snapshot.source,
                target: snapshot.target,
                edge_type: snapshot.edge_type,
            })
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        let mapping = self
            .explicit_mappings()
            .into_iter()
            .map(|(node, cluster)| MappingSpec {
                node: self.node_id(node).to_string(),
                cluster: self.node_id(cluster).to_string(),
            })
            .collect();

        GraphSpec {
            allow_dependencies_to_parents: self.allows_dependencies_to_parents(),
            nodes,
            edges,
            mapping,
        }
    }

    /// Find node by id or fail with `NodeNotFound`
    pub fn require_node(&self, id: &str) -> Result<petgraph::stable_graph::NodeIndex> {
        self.node_index(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }
}
