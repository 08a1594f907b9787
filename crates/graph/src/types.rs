use crate::error::{GraphError, Result};
use crate::event::{ChangeEvent, ChangeType};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Edge type used when none is given explicitly.
pub const DEFAULT_EDGE_TYPE: &str = "Source_Dependency";

/// The part of the reflexion graph a node or edge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subgraph {
    Architecture,
    Implementation,
}

impl fmt::Display for Subgraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Architecture => f.write_str("architecture"),
            Self::Implementation => f.write_str("implementation"),
        }
    }
}

/// Reflexion state of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// No state could be determined
    Undefined,

    /// Architecture dependency that was declared
    Specified,

    /// Implementation dependency with at least one unmapped endpoint
    Unmapped,

    /// Implementation dependency covered by an architecture dependency
    Allowed,

    /// Implementation dependency not covered by any architecture dependency
    Divergent,

    /// Architecture dependency without any allowed implementation dependency
    Absent,

    /// Architecture dependency with at least one allowed implementation dependency
    Convergent,

    /// Implementation dependency inside one cluster or towards a parent cluster
    ImplicitlyAllowed,

    /// Reserved for optional architecture dependencies
    AllowedAbsent,
}

impl State {
    /// `true` for `Allowed` and `ImplicitlyAllowed`
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed | Self::ImplicitlyAllowed)
    }
}

/// Node in the reflexion graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique node id (e.g., "auth.Service")
    pub id: String,

    /// Node type (e.g., "Class", "Package", "Cluster")
    pub node_type: String,

    /// Architecture or implementation
    pub subgraph: Subgraph,

    /// String attributes (e.g., "Source.Name", "Source.File")
    #[serde(default)]
    pub string_attributes: BTreeMap<String, String>,

    /// Integer attributes (e.g., "Source.Line")
    #[serde(default)]
    pub int_attributes: BTreeMap<String, i64>,

    /// Toggle attributes (e.g., "Element.Is_Artificial")
    #[serde(default)]
    pub toggles: BTreeSet<String>,

    #[serde(skip)]
    pub(crate) parent: Option<NodeIndex>,

    #[serde(skip)]
    pub(crate) children: Vec<NodeIndex>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, subgraph: Subgraph) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            subgraph,
            string_attributes: BTreeMap::new(),
            int_attributes: BTreeMap::new(),
            toggles: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn architecture(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::new(id, node_type, Subgraph::Architecture)
    }

    pub fn implementation(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::new(id, node_type, Subgraph::Implementation)
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_int_attribute(mut self, key: impl Into<String>, value: i64) -> Self {
        self.int_attributes.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_toggle(mut self, toggle: impl Into<String>) -> Self {
        self.toggles.insert(toggle.into());
        self
    }

    pub fn string_attribute(&self, key: &str) -> Option<&str> {
        self.string_attributes.get(key).map(String::as_str)
    }

    pub fn int_attribute(&self, key: &str) -> Option<i64> {
        self.int_attributes.get(key).copied()
    }

    pub fn has_toggle(&self, toggle: &str) -> bool {
        self.toggles.contains(toggle)
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn is_in(&self, subgraph: Subgraph) -> bool {
        self.subgraph == subgraph
    }
}

/// Dependency edge in the reflexion graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub edge_type: String,
    pub subgraph: Subgraph,
}

impl GraphEdge {
    pub fn is_in(&self, subgraph: Subgraph) -> bool {
        self.subgraph == subgraph
    }
}

/// Architecture, implementation and mapping in one graph.
///
/// Dependencies live in a petgraph `StableDiGraph` so indices survive removals;
/// the containment hierarchy is stored on the nodes as parent/children indices.
pub struct ReflexionGraph {
    pub(crate) graph: StableDiGraph<GraphNode, GraphEdge>,

    /// Node id -> NodeIndex
    pub(crate) node_index: HashMap<String, NodeIndex>,

    /// Edge id -> EdgeIndex
    pub(crate) edge_index: HashMap<String, EdgeIndex>,

    /// Explicit mapping: implementation node -> cluster
    pub(crate) mapping: HashMap<NodeIndex, NodeIndex>,

    pub(crate) events: Vec<ChangeEvent>,
    pub(crate) suppress_notifications: bool,
    pub(crate) allow_dependencies_to_parents: bool,
    pub(crate) mapping_mutations: usize,
}

impl ReflexionGraph {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            mapping: HashMap::new(),
            events: Vec::new(),
            suppress_notifications: false,
            allow_dependencies_to_parents: true,
            mapping_mutations: 0,
        }
    }

    /// Add node to graph
    pub fn add_node(&mut self, mut node: GraphNode) -> Result<NodeIndex> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        node.parent = None;
        node.children.clear();

        let id = node.id.clone();
        let subgraph = node.subgraph;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id.clone(), idx);

        if subgraph == Subgraph::Architecture {
            self.notify(ChangeEvent::ArchitectureNode {
                node: id,
                change: ChangeType::Addition,
            });
        }
        Ok(idx)
    }

    /// Make `parent` the parent of `child`, detaching it from its previous parent
    pub fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) -> Result<()> {
        let child_node = self.node_or_err(child)?;
        let parent_node = self.node_or_err(parent)?;
        if child_node.subgraph != parent_node.subgraph {
            return Err(GraphError::not_in_subgraph(
                parent_node.id.clone(),
                child_node.subgraph,
            ));
        }
        if child == parent || self.is_descendant_of(parent, child) {
            return Err(GraphError::HierarchyCycle {
                child: child_node.id.clone(),
                parent: parent_node.id.clone(),
            });
        }

        self.detach(child);
        if let Some(node) = self.graph.node_weight_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.graph.node_weight_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    pub(crate) fn detach(&mut self, child: NodeIndex) {
        let old_parent = self.graph.node_weight_mut(child).and_then(|n| n.parent.take());
        if let Some(old) = old_parent {
            if let Some(node) = self.graph.node_weight_mut(old) {
                node.children.retain(|&c| c != child);
            }
        }
    }

    /// Find node by id
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    /// Find edge by id
    pub fn edge_index(&self, id: &str) -> Option<EdgeIndex> {
        self.edge_index.get(id).copied()
    }

    /// Get node data
    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    /// Get node data or fail with `NodeNotFound`
    pub fn node_or_err(&self, idx: NodeIndex) -> Result<&GraphNode> {
        self.graph
            .node_weight(idx)
            .ok_or_else(|| GraphError::NodeNotFound(format!("{idx:?}")))
    }

    /// Get edge data
    pub fn edge(&self, idx: EdgeIndex) -> Option<&GraphEdge> {
        self.graph.edge_weight(idx)
    }

    /// Id of a node, empty if unknown
    pub fn node_id(&self, idx: NodeIndex) -> &str {
        self.graph.node_weight(idx).map_or("", |n| n.id.as_str())
    }

    pub fn contains_node(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &GraphEdge)> {
        self.graph
            .edge_indices()
            .filter_map(move |idx| self.graph.edge_weight(idx).map(|edge| (idx, edge)))
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether implementation dependencies towards an enclosing cluster are implicitly allowed
    pub fn set_allow_dependencies_to_parents(&mut self, allow: bool) {
        self.allow_dependencies_to_parents = allow;
    }

    #[must_use]
    pub const fn allows_dependencies_to_parents(&self) -> bool {
        self.allow_dependencies_to_parents
    }
}

impl Default for ReflexionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReflexionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflexionGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("mapped", &self.mapping.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
