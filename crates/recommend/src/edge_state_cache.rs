use crate::error::Result;
use reflexion_graph::{EdgeIndex, NodeIndex, ReflexionGraph, State};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    candidate: String,
    cluster: String,
    neighbor: String,
    neighbor_cluster: String,
    edge: String,
}

/// States implementation edges would have if a candidate were mapped onto a cluster.
///
/// Entries stay valid while the neighbor keeps its cluster and the architecture
/// is unchanged; owners clear the cache on architecture changes.
#[derive(Debug, Default)]
pub struct EdgeStateCache {
    states: HashMap<CacheKey, State>,
}

impl EdgeStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `edge` between `candidate` (mapped onto `cluster`) and `neighbor`.
    ///
    /// Only edges leaving the candidate's subtree are probed. An edge to a
    /// descendant of the candidate is `Undefined`.
    pub fn get(
        &mut self,
        graph: &mut ReflexionGraph,
        cluster: NodeIndex,
        candidate: NodeIndex,
        neighbor: NodeIndex,
        edge: EdgeIndex,
    ) -> Result<State> {
        let Some(neighbor_cluster) = graph.maps_to(neighbor) else {
            return Ok(State::Unmapped);
        };
        if candidate == neighbor && neighbor_cluster != cluster {
            return Ok(State::Undefined);
        }

        if graph.is_descendant_of(neighbor, candidate) {
            log::debug!(
                "{} stays inside the subtree of {}, no state to probe",
                graph.edge(edge).map_or("?", |e| e.id.as_str()),
                graph.node_id(candidate)
            );
            return Ok(State::Undefined);
        }

        let key = Self::key(graph, candidate, cluster, neighbor, neighbor_cluster, edge);
        if let Some(&state) = self.states.get(&key) {
            return Ok(state);
        }

        self.update_cache(graph, candidate, cluster)?;
        match self.states.get(&key) {
            Some(&state) => Ok(state),
            None => {
                log::debug!(
                    "no cached state for {} ({} -> {}) after probing {} -> {}",
                    key.edge,
                    key.neighbor,
                    key.neighbor_cluster,
                    key.candidate,
                    key.cluster
                );
                Ok(State::Undefined)
            }
        }
    }

    /// Probe `candidate -> cluster` and cache the states of all edges leaving its subtree
    pub fn update_cache(
        &mut self,
        graph: &mut ReflexionGraph,
        candidate: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<()> {
        let probe = graph.probe_mapping(candidate, cluster)?;
        for border in probe.subtree_boundary_edges(candidate) {
            let Some(neighbor_cluster) = probe.maps_to(border.outer) else {
                continue;
            };
            let key = Self::key(
                &probe,
                candidate,
                cluster,
                border.outer,
                neighbor_cluster,
                border.edge,
            );
            self.states.insert(key, probe.edge_state(border.edge));
        }
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn key(
        graph: &ReflexionGraph,
        candidate: NodeIndex,
        cluster: NodeIndex,
        neighbor: NodeIndex,
        neighbor_cluster: NodeIndex,
        edge: EdgeIndex,
    ) -> CacheKey {
        CacheKey {
            candidate: graph.node_id(candidate).to_string(),
            cluster: graph.node_id(cluster).to_string(),
            neighbor: graph.node_id(neighbor).to_string(),
            neighbor_cluster: graph.node_id(neighbor_cluster).to_string(),
            edge: graph.edge(edge).map(|e| e.id.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reflexion_graph::GraphNode;

    struct Setup {
        graph: ReflexionGraph,
        a: NodeIndex,
        b: NodeIndex,
        x: NodeIndex,
        y: NodeIndex,
        edge: EdgeIndex,
    }

    fn setup() -> Setup {
        let mut graph = ReflexionGraph::new();
        let a = graph.add_node(GraphNode::architecture("A", "Cluster")).unwrap();
        let b = graph.add_node(GraphNode::architecture("B", "Cluster")).unwrap();
        graph.add_edge(a, b, "Source_Dependency").unwrap();
        let x = graph.add_node(GraphNode::implementation("x", "Class")).unwrap();
        let y = graph.add_node(GraphNode::implementation("y", "Class")).unwrap();
        let edge = graph.add_edge(x, y, "Call").unwrap();
        graph.add_to_mapping(y, b).unwrap();
        graph.clear_events();
        Setup { graph, a, b, x, y, edge }
    }

    #[test]
    fn test_hypothetical_states() {
        let Setup { mut graph, a, b, x, y, edge } = setup();
        let mut cache = EdgeStateCache::new();

        assert_eq!(cache.get(&mut graph, a, x, y, edge).unwrap(), State::Allowed);
        assert_eq!(cache.get(&mut graph, b, x, y, edge).unwrap(), State::ImplicitlyAllowed);
        assert_eq!(cache.len(), 2);

        assert_eq!(graph.maps_to(x), None);
        assert!(graph.pending_events().is_empty());
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let Setup { mut graph, a, x, y, edge, .. } = setup();
        let mut cache = EdgeStateCache::new();

        cache.get(&mut graph, a, x, y, edge).unwrap();
        let mutations = graph.mapping_mutations();
        assert_eq!(cache.get(&mut graph, a, x, y, edge).unwrap(), State::Allowed);
        assert_eq!(graph.mapping_mutations(), mutations);
    }

    #[test]
    fn test_unmapped_neighbor_is_not_cached() {
        let Setup { mut graph, a, x, y, edge, .. } = setup();
        graph.remove_from_mapping(y).unwrap();
        let mut cache = EdgeStateCache::new();

        assert_eq!(cache.get(&mut graph, a, x, y, edge).unwrap(), State::Unmapped);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_edge_into_own_subtree_is_undefined() {
        let Setup { mut graph, a, b, x, .. } = setup();
        let inner = graph.add_node(GraphNode::implementation("inner", "Class")).unwrap();
        graph.set_parent(inner, x).unwrap();
        graph.add_to_mapping(inner, b).unwrap();
        let edge = graph.add_edge(x, inner, "Call").unwrap();
        let mut cache = EdgeStateCache::new();

        assert_eq!(cache.get(&mut graph, a, x, inner, edge).unwrap(), State::Undefined);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_cache() {
        let Setup { mut graph, a, x, y, edge, .. } = setup();
        let mut cache = EdgeStateCache::new();
        cache.get(&mut graph, a, x, y, edge).unwrap();

        cache.clear_cache();
        assert!(cache.is_empty());
    }
}
