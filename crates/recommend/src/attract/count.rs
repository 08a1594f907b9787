use super::AttractBase;
use crate::config::CountConfig;
use crate::edge_state_cache::EdgeStateCache;
use crate::error::Result;
use reflexion_graph::{ChangeType, EdgeIndex, NodeIndex, ReflexionGraph};
use std::collections::{BTreeMap, HashMap};

/// Counts the dependencies of a candidate's subtree.
///
/// `overall(d)` is the weight of all dependencies between `d` and mapped nodes.
/// The attraction to a cluster subtracts what leads to other clusters, where
/// dependencies the architecture allows only count with `phi`:
///
/// ```text
/// attraction(c, k) = Σ_{d ∈ subtree(c)} overall(d) - to_others(d, k)
/// ```
#[derive(Debug)]
pub struct CountAttract {
    pub(crate) base: AttractBase,
    phi: f64,
    overall: BTreeMap<String, f64>,
    /// (edge id, node id) -> weight currently credited to `overall[node]`
    credited: HashMap<(String, String), f64>,
    cache: EdgeStateCache,
}

impl CountAttract {
    pub fn new(base: AttractBase, config: &CountConfig) -> Self {
        Self {
            base,
            phi: config.phi,
            overall: BTreeMap::new(),
            credited: HashMap::new(),
            cache: EdgeStateCache::new(),
        }
    }

    pub fn phi(&self) -> f64 {
        self.phi
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
            let overall = self.overall(graph, node);
            let to_others = self.to_others(graph, node, cluster)?;
            attraction += overall - to_others;
        }
        Ok(attraction)
    }

    /// Weight of all dependencies between `node` and mapped nodes
    pub fn overall(&self, graph: &ReflexionGraph, node: NodeIndex) -> f64 {
        self.overall.get(graph.node_id(node)).copied().unwrap_or(0.0)
    }

    /// Weight of the dependencies of `node` leading to clusters other than `cluster`
    pub fn to_others(
        &mut self,
        graph: &mut ReflexionGraph,
        node: NodeIndex,
        cluster: NodeIndex,
    ) -> Result<f64> {
        let mut sum = 0.0;
        for edge in graph.implementation_edges(node) {
            let Some(neighbor) = graph.other_endpoint(edge, node) else {
                continue;
            };
            let Some(neighbor_cluster) = graph.maps_to(neighbor) else {
                continue;
            };
            if neighbor_cluster == cluster {
                continue;
            }

            let mut weight = self.base.edge_weight(graph, edge);
            if self.cache.get(graph, cluster, node, neighbor, edge)?.is_allowed() {
                weight *= self.phi;
            }
            sum += weight;
        }
        Ok(sum)
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
        self.base.flag_cluster_with_neighbors(graph, cluster);

        let Some(idx) = graph.node_index(node) else {
            log::debug!("count attract: mapped node {node} no longer exists");
            return Ok(());
        };
        if change == ChangeType::Removal {
            self.base.tracker.add_candidate(graph, &self.base.types, idx);
        }

        // the whole subtree may have changed its mapping, nested explicit mappings included
        for member in graph.post_order_descendants(idx) {
            for edge in graph.implementation_edges(member) {
                let Some(neighbor) = graph.other_endpoint(edge, member) else {
                    continue;
                };
                self.recredit(graph, edge, member, neighbor);
                self.recredit(graph, edge, neighbor, member);
            }
        }
        Ok(())
    }

    /// Bring the weight `edge` credits to `overall[node]` in line with the current mapping
    fn recredit(&mut self, graph: &ReflexionGraph, edge: EdgeIndex, node: NodeIndex, neighbor: NodeIndex) {
        let Some(edge_id) = graph.edge(edge).map(|data| data.id.clone()) else {
            return;
        };
        let node_id = graph.node_id(node).to_string();

        let mapped_apart = graph.maps_to(neighbor).is_some()
            && (graph.mapped_ancestor(node).is_none()
                || graph.mapped_ancestor(node) != graph.mapped_ancestor(neighbor));
        let target = if mapped_apart {
            self.base.edge_weight(graph, edge)
        } else {
            0.0
        };

        let key = (edge_id, node_id);
        let current = self.credited.get(&key).copied().unwrap_or(0.0);
        if current == target {
            return;
        }
        *self.overall.entry(key.1.clone()).or_insert(0.0) += target - current;
        if target == 0.0 {
            self.credited.remove(&key);
        } else {
            self.credited.insert(key, target);
        }
        self.base.flag_candidates_containing(graph, node);
    }

    pub fn handle_added_cluster(&mut self, graph: &ReflexionGraph, cluster: &str) {
        self.base.flag_cluster(graph, cluster);
        self.base.mark_all_candidates(graph);
    }

    pub fn reset(&mut self) {
        self.overall.clear();
        self.credited.clear();
        self.cache.clear_cache();
        self.base.tracker.reset();
    }

    pub fn empty_training_data(&self) -> bool {
        self.overall.values().all(|value| value.abs() < 1e-9)
    }

    pub fn dump_training_data(&self) -> String {
        let mut out = format!("phi = {}\n", self.phi);
        for (node, value) in &self.overall {
            out.push_str(&format!("overall({node}) = {value}\n"));
        }
        out
    }

    pub fn clear_state_cache(&mut self) {
        self.cache.clear_cache();
    }
}
