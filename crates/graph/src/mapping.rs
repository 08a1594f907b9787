use crate::error::{GraphError, Result};
use crate::event::{ChangeEvent, ChangeType};
use crate::types::{ReflexionGraph, Subgraph};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::ops::Deref;

impl ReflexionGraph {
    /// Cluster a node is mapped to, explicitly or through its nearest mapped ancestor
    pub fn maps_to(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.mapped_ancestor(node)
            .and_then(|anc| self.mapping.get(&anc).copied())
    }

    /// Nearest explicitly mapped node among `node` and its ancestors
    pub fn mapped_ancestor(&self, node: NodeIndex) -> Option<NodeIndex> {
        if self.mapping.contains_key(&node) {
            return Some(node);
        }
        self.ascendants(node)
            .into_iter()
            .find(|anc| self.mapping.contains_key(anc))
    }

    pub fn is_explicitly_mapped(&self, node: NodeIndex) -> bool {
        self.mapping.contains_key(&node)
    }

    /// Cluster of an explicitly mapped node
    pub fn explicit_mapping(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.mapping.get(&node).copied()
    }

    /// All explicit mappings, sorted by node id
    pub fn explicit_mappings(&self) -> Vec<(NodeIndex, NodeIndex)> {
        let mut result: Vec<(NodeIndex, NodeIndex)> =
            self.mapping.iter().map(|(&n, &c)| (n, c)).collect();
        result.sort_by(|a, b| self.node_id(a.0).cmp(self.node_id(b.0)));
        result
    }

    /// Number of mapping mutations so far, silent ones included
    #[must_use]
    pub const fn mapping_mutations(&self) -> usize {
        self.mapping_mutations
    }

    /// Map `node` explicitly onto `cluster` and record the resulting events
    pub fn add_to_mapping(&mut self, node: NodeIndex, cluster: NodeIndex) -> Result<()> {
        self.check_mapping_ends(node, cluster)?;
        if let Some(current) = self.mapping.get(&node) {
            return Err(GraphError::AlreadyMapped {
                node: self.node_id(node).to_string(),
                cluster: self.node_id(*current).to_string(),
            });
        }

        let affected = self.subtree_edges_for_notification(node);
        let before = self.states_of(&affected);
        self.insert_mapping(node, cluster);
        self.notify(ChangeEvent::MapsTo {
            node: self.node_id(node).to_string(),
            cluster: self.node_id(cluster).to_string(),
            change: ChangeType::Addition,
        });
        self.notify_state_changes(before);
        Ok(())
    }

    /// Remove the explicit mapping of `node` and record the resulting events
    pub fn remove_from_mapping(&mut self, node: NodeIndex) -> Result<()> {
        let Some(&cluster) = self.mapping.get(&node) else {
            return Err(GraphError::NotMapped(self.node_id(node).to_string()));
        };

        let affected = self.subtree_edges_for_notification(node);
        let before = self.states_of(&affected);
        self.remove_mapping(node);
        self.notify(ChangeEvent::MapsTo {
            node: self.node_id(node).to_string(),
            cluster: self.node_id(cluster).to_string(),
            change: ChangeType::Removal,
        });
        self.notify_state_changes(before);
        Ok(())
    }

    /// Like `add_to_mapping` without recording events
    pub fn add_to_mapping_silently(&mut self, node: NodeIndex, cluster: NodeIndex) -> Result<()> {
        self.check_mapping_ends(node, cluster)?;
        if let Some(current) = self.mapping.get(&node) {
            return Err(GraphError::AlreadyMapped {
                node: self.node_id(node).to_string(),
                cluster: self.node_id(*current).to_string(),
            });
        }
        self.insert_mapping(node, cluster);
        Ok(())
    }

    /// Like `remove_from_mapping` without recording events
    pub fn remove_from_mapping_silently(&mut self, node: NodeIndex) -> Result<()> {
        if !self.mapping.contains_key(&node) {
            return Err(GraphError::NotMapped(self.node_id(node).to_string()));
        }
        self.remove_mapping(node);
        Ok(())
    }

    /// Remove every explicit mapping, notifying each removal
    pub fn reset_mapping(&mut self) -> Result<()> {
        for (node, _) in self.explicit_mappings() {
            self.remove_from_mapping(node)?;
        }
        Ok(())
    }

    /// Temporarily map `candidate` onto `cluster`.
    ///
    /// A previously mapped ancestor-or-self is unmapped for the lifetime of the
    /// probe. All changes are silent and undone when the probe is dropped.
    pub fn probe_mapping(
        &mut self,
        candidate: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<MappingProbe<'_>> {
        self.check_mapping_ends(candidate, cluster)?;

        let restore = self
            .mapped_ancestor(candidate)
            .and_then(|anc| self.mapping.get(&anc).map(|&c| (anc, c)));
        if let Some((anc, _)) = restore {
            self.remove_mapping(anc);
        }
        self.insert_mapping(candidate, cluster);

        Ok(MappingProbe {
            graph: self,
            candidate,
            restore,
        })
    }

    fn check_mapping_ends(&self, node: NodeIndex, cluster: NodeIndex) -> Result<()> {
        let node_data = self.node_or_err(node)?;
        if node_data.subgraph != Subgraph::Implementation {
            return Err(GraphError::not_in_subgraph(
                node_data.id.clone(),
                Subgraph::Implementation,
            ));
        }
        let cluster_data = self.node_or_err(cluster)?;
        if cluster_data.subgraph != Subgraph::Architecture {
            return Err(GraphError::not_in_subgraph(
                cluster_data.id.clone(),
                Subgraph::Architecture,
            ));
        }
        Ok(())
    }

    fn subtree_edges_for_notification(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        if self.suppress_notifications {
            return Vec::new();
        }
        let mut edges: Vec<EdgeIndex> = self
            .post_order_descendants(node)
            .into_iter()
            .flat_map(|d| self.implementation_edges(d))
            .collect();
        edges.sort();
        edges.dedup();
        edges
    }

    pub(crate) fn insert_mapping(&mut self, node: NodeIndex, cluster: NodeIndex) {
        self.mapping.insert(node, cluster);
        self.mapping_mutations += 1;
    }

    pub(crate) fn remove_mapping(&mut self, node: NodeIndex) {
        self.mapping.remove(&node);
        self.mapping_mutations += 1;
    }
}

/// Scoped hypothetical mapping created by [`ReflexionGraph::probe_mapping`].
///
/// Dereferences to the graph for read access; the original mapping is
/// restored on drop.
pub struct MappingProbe<'g> {
    graph: &'g mut ReflexionGraph,
    candidate: NodeIndex,
    restore: Option<(NodeIndex, NodeIndex)>,
}

impl MappingProbe<'_> {
    pub fn candidate(&self) -> NodeIndex {
        self.candidate
    }
}

impl Deref for MappingProbe<'_> {
    type Target = ReflexionGraph;

    fn deref(&self) -> &ReflexionGraph {
        &*self.graph
    }
}

impl Drop for MappingProbe<'_> {
    fn drop(&mut self) {
        self.graph.remove_mapping(self.candidate);
        if let Some((node, cluster)) = self.restore {
            self.graph.insert_mapping(node, cluster);
        }
    }
}
