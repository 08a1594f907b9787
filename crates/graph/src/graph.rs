use crate::error::{GraphError, Result};
use crate::event::{ChangeEvent, ChangeType, EdgeSnapshot};
use crate::types::{GraphEdge, ReflexionGraph, Subgraph};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;

/// Implementation edge crossing the border of a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtreeEdge {
    pub edge: EdgeIndex,

    /// Endpoint inside the subtree
    pub inner: NodeIndex,

    /// Endpoint outside the subtree
    pub outer: NodeIndex,

    /// `true` if `inner` is the source of the edge
    pub outgoing: bool,
}

impl ReflexionGraph {
    /// Add an edge with a generated id (`source#type#target`, suffixed on collision)
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        edge_type: impl Into<String>,
    ) -> Result<EdgeIndex> {
        let edge_type = edge_type.into();
        let base = format!(
            "{}#{}#{}",
            self.node_id(source),
            edge_type,
            self.node_id(target)
        );
        let mut id = base.clone();
        let mut counter = 1;
        while self.edge_index.contains_key(&id) {
            id = format!("{base}#{counter}");
            counter += 1;
        }
        self.add_edge_with_id(id, source, target, edge_type)
    }

    /// Add an edge with an explicit id.
    ///
    /// Both endpoints must be in the same subgraph. Adding an architecture
    /// dependency records an `ArchitectureEdge` event followed by the state
    /// changes it causes.
    pub fn add_edge_with_id(
        &mut self,
        id: impl Into<String>,
        source: NodeIndex,
        target: NodeIndex,
        edge_type: impl Into<String>,
    ) -> Result<EdgeIndex> {
        let id = id.into();
        if self.edge_index.contains_key(&id) {
            return Err(GraphError::DuplicateEdge(id));
        }
        let subgraph = self.node_or_err(source)?.subgraph;
        let target_node = self.node_or_err(target)?;
        if target_node.subgraph != subgraph {
            return Err(GraphError::not_in_subgraph(target_node.id.clone(), subgraph));
        }

        let before = self.states_before_architecture_change(subgraph);
        let idx = self.graph.add_edge(
            source,
            target,
            GraphEdge {
                id: id.clone(),
                edge_type: edge_type.into(),
                subgraph,
            },
        );
        self.edge_index.insert(id, idx);

        if subgraph == Subgraph::Architecture {
            if let Some(snapshot) = self.snapshot(idx) {
                self.notify(ChangeEvent::ArchitectureEdge {
                    edge: snapshot,
                    change: ChangeType::Addition,
                });
            }
            self.notify_state_changes(before);
        }
        Ok(idx)
    }

    /// Remove an edge and return what it looked like
    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Result<EdgeSnapshot> {
        let subgraph = self
            .edge(edge)
            .map(|e| e.subgraph)
            .ok_or_else(|| GraphError::EdgeNotFound(format!("{edge:?}")))?;
        let snapshot = self
            .snapshot(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(format!("{edge:?}")))?;

        let before = self.states_before_architecture_change(subgraph);
        self.graph.remove_edge(edge);
        self.edge_index.remove(&snapshot.id);

        if subgraph == Subgraph::Architecture {
            self.notify_state_changes(before);
            self.notify(ChangeEvent::ArchitectureEdge {
                edge: snapshot.clone(),
                change: ChangeType::Removal,
            });
        }
        Ok(snapshot)
    }

    /// Remove an architecture node.
    ///
    /// Nodes explicitly mapped onto it are unmapped first (with notification),
    /// then its dependencies are removed and its children detached.
    pub fn remove_architecture_node(&mut self, node: NodeIndex) -> Result<()> {
        let data = self.node_or_err(node)?;
        if data.subgraph != Subgraph::Architecture {
            return Err(GraphError::Unsupported(format!(
                "only architecture nodes can be removed, {} is an implementation node",
                data.id
            )));
        }
        let id = data.id.clone();
        let children = data.children.clone();

        let mut mapped: Vec<NodeIndex> = self
            .mapping
            .iter()
            .filter(|&(_, &cluster)| cluster == node)
            .map(|(&n, _)| n)
            .collect();
        mapped.sort_by(|a, b| self.node_id(*a).cmp(self.node_id(*b)));
        for n in mapped {
            self.remove_from_mapping(n)?;
        }

        let mut incident = self.incomings(node);
        incident.extend(self.outgoings(node));
        incident.sort();
        incident.dedup();
        for edge in incident {
            self.remove_edge(edge)?;
        }

        for child in children {
            self.detach(child);
        }
        self.detach(node);
        self.graph.remove_node(node);
        self.node_index.remove(&id);

        log::debug!("removed architecture node {id}");
        self.notify(ChangeEvent::ArchitectureNode {
            node: id,
            change: ChangeType::Removal,
        });
        Ok(())
    }

    /// Ids and type of an edge
    pub fn snapshot(&self, edge: EdgeIndex) -> Option<EdgeSnapshot> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        let data = self.graph.edge_weight(edge)?;
        Some(EdgeSnapshot {
            id: data.id.clone(),
            source: self.node_id(source).to_string(),
            target: self.node_id(target).to_string(),
            edge_type: data.edge_type.clone(),
        })
    }

    pub fn endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// The endpoint of `edge` that is not `node`
    pub fn other_endpoint(&self, edge: EdgeIndex, node: NodeIndex) -> Option<NodeIndex> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        Some(if source == node { target } else { source })
    }

    /// Strict ancestors, nearest first
    pub fn ascendants(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        let mut cursor = self.graph.node_weight(node).and_then(|n| n.parent);
        while let Some(current) = cursor {
            result.push(current);
            cursor = self.graph.node_weight(current).and_then(|n| n.parent);
        }
        result
    }

    /// The node itself followed by its ancestors, nearest first
    pub fn ancestors_or_self(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut result = vec![node];
        result.extend(self.ascendants(node));
        result
    }

    /// `true` if `ancestor` is a strict ancestor of `node`
    pub fn is_descendant_of(&self, node: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut cursor = self.graph.node_weight(node).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.graph.node_weight(current).and_then(|n| n.parent);
        }
        false
    }

    /// Subtree of `node` in post order: children before parents, `node` last
    pub fn post_order_descendants(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        if !self.graph.contains_node(node) {
            return result;
        }

        let mut stack = vec![(node, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                result.push(current);
                continue;
            }
            stack.push((current, true));
            if let Some(data) = self.graph.node_weight(current) {
                for &child in data.children.iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        result
    }

    /// Incoming dependency edges of a node
    pub fn incomings(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        self.directed_edges(node, Direction::Incoming)
    }

    /// Outgoing dependency edges of a node
    pub fn outgoings(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        self.directed_edges(node, Direction::Outgoing)
    }

    fn directed_edges(&self, node: NodeIndex, direction: Direction) -> Vec<EdgeIndex> {
        if !self.graph.contains_node(node) {
            return Vec::new();
        }
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(node, direction)
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges
    }

    /// Incoming and outgoing implementation edges of a node
    pub fn implementation_edges(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges = self.incomings(node);
        edges.extend(self.outgoings(node));
        edges.sort();
        edges.dedup();
        edges.retain(|&e| {
            self.graph
                .edge_weight(e)
                .is_some_and(|w| w.subgraph == Subgraph::Implementation)
        });
        edges
    }

    /// Implementation edges between the subtree of `root` and the rest of the graph
    pub fn subtree_boundary_edges(&self, root: NodeIndex) -> Vec<SubtreeEdge> {
        let subtree: HashSet<NodeIndex> = self.post_order_descendants(root).into_iter().collect();
        let mut result = Vec::new();
        for &inner in self.post_order_descendants(root).iter() {
            for edge in self.implementation_edges(inner) {
                let Some((source, target)) = self.graph.edge_endpoints(edge) else {
                    continue;
                };
                let outgoing = source == inner;
                let outer = if outgoing { target } else { source };
                if subtree.contains(&outer) {
                    continue;
                }
                result.push(SubtreeEdge {
                    edge,
                    inner,
                    outer,
                    outgoing,
                });
            }
        }
        result
    }

    /// All implementation edges of the graph
    pub fn all_implementation_edges(&self) -> Vec<EdgeIndex> {
        self.edges()
            .filter(|(_, e)| e.subgraph == Subgraph::Implementation)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// All architecture dependencies of the graph
    pub fn architecture_edges(&self) -> Vec<EdgeIndex> {
        self.edges()
            .filter(|(_, e)| e.subgraph == Subgraph::Architecture)
            .map(|(idx, _)| idx)
            .collect()
    }
}
