use crate::error::{RecommendError, Result};
use crate::mapping_pair::MappingPair;
use crate::recommendations::Recommendations;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reflexion_graph::{NodeIndex, ReflexionGraph};
use std::collections::{BTreeMap, HashSet};

/// Explicit mapping of the oracle that decides where a candidate belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleMapping {
    /// Mapped node, the candidate itself or one of its ancestors
    pub node: String,
    pub cluster: String,
}

/// A reflexion graph whose mapping is known to be correct.
///
/// Candidates and clusters are matched with the graph under evaluation by id.
#[derive(Debug)]
pub struct Oracle {
    graph: ReflexionGraph,
}

impl Oracle {
    pub fn new(graph: ReflexionGraph) -> Self {
        Self { graph }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(ReflexionGraph::from_json(json)?))
    }

    pub fn graph(&self) -> &ReflexionGraph {
        &self.graph
    }

    /// Cluster the oracle maps `candidate` to, explicitly or through an ancestor
    pub fn expected_cluster(&self, candidate: &str) -> Option<&str> {
        let node = self.graph.node_index(candidate)?;
        self.graph.maps_to(node).map(|cluster| self.graph.node_id(cluster))
    }

    /// `true` if mapping `candidate` onto `cluster` agrees with the oracle.
    ///
    /// Clusters nested in the expected cluster count as hits.
    pub fn is_hit(&self, candidate: &str, cluster: &str) -> bool {
        let (Some(candidate), Some(cluster)) = (self.graph.node_index(candidate), self.graph.node_index(cluster))
        else {
            return false;
        };
        let candidate_side: HashSet<NodeIndex> = self.graph.ancestors_or_self(candidate).into_iter().collect();
        let cluster_side: HashSet<NodeIndex> = self.graph.ancestors_or_self(cluster).into_iter().collect();
        self.graph
            .explicit_mappings()
            .into_iter()
            .any(|(node, target)| candidate_side.contains(&node) && cluster_side.contains(&target))
    }

    /// The single explicit mapping whose subtree contains `candidate`
    pub fn oracle_mapping(&self, candidate: &str) -> Result<OracleMapping> {
        let node = self
            .graph
            .node_index(candidate)
            .ok_or_else(|| RecommendError::OracleIncomplete(candidate.to_string()))?;
        let covering: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .explicit_mappings()
            .into_iter()
            .filter(|&(mapped, _)| mapped == node || self.graph.is_descendant_of(node, mapped))
            .collect();

        match covering.as_slice() {
            [] => Err(RecommendError::OracleIncomplete(candidate.to_string())),
            [(mapped, cluster)] => Ok(OracleMapping {
                node: self.graph.node_id(*mapped).to_string(),
                cluster: self.graph.node_id(*cluster).to_string(),
            }),
            _ => Err(RecommendError::OracleAmbiguous {
                node: candidate.to_string(),
                count: covering.len(),
            }),
        }
    }

    /// Ids of all clusters `candidate` may be mapped onto
    pub fn accepted_clusters(&self, candidate: &str) -> Result<HashSet<String>> {
        let mapping = self.oracle_mapping(candidate)?;
        let cluster = self.graph.require_node(&mapping.cluster)?;
        Ok(self
            .graph
            .post_order_descendants(cluster)
            .into_iter()
            .map(|idx| self.graph.node_id(idx).to_string())
            .collect())
    }

    /// Percentile rank of `candidate` among `pairs` leading into its accepted clusters
    pub fn percentile_rank(&self, candidate: &str, pairs: &[MappingPair]) -> Result<Option<f64>> {
        let accepted = self.accepted_clusters(candidate)?;
        Ok(Recommendations::percentile_rank(candidate, pairs, &accepted))
    }

    /// Pick unmapped candidates of `graph` to map onto their expected clusters.
    ///
    /// Clusters take turns, each contributing one randomly chosen candidate per
    /// round, until `percentage` of all candidates is mapped or nothing is left.
    /// Returns (candidate, cluster) ids in the order they were picked.
    pub fn initial_mapping(
        &self,
        recommendations: &Recommendations,
        graph: &ReflexionGraph,
        percentage: f64,
        seed: u64,
    ) -> Result<Vec<(String, String)>> {
        if !(0.0..=1.0).contains(&percentage) {
            return Err(RecommendError::InvalidSettings(format!(
                "initial mapping percentage ({percentage}) must be within [0, 1]"
            )));
        }

        let candidates = recommendations.candidates(graph).len();
        if candidates == 0 {
            return Ok(Vec::new());
        }
        let already_mapped = recommendations.mapped_candidates(graph).len();

        let mut expected: BTreeMap<String, Vec<String>> = self
            .graph
            .nodes()
            .filter(|(_, node)| recommendations.is_cluster(node))
            .map(|(_, node)| (node.id.clone(), Vec::new()))
            .collect();
        for candidate in recommendations.unmapped_candidates(graph) {
            let id = graph.node_id(candidate);
            let Some(cluster) = self.expected_cluster(id) else {
                continue;
            };
            match expected.get_mut(cluster) {
                Some(pending) => pending.push(id.to_string()),
                None => log::warn!("oracle maps {id} onto {cluster}, which is no cluster"),
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = Vec::new();
        let mut available: usize = expected.values().map(Vec::len).sum();
        while ((already_mapped + picked.len()) as f64 / candidates as f64) < percentage && available > 0 {
            for (cluster, pending) in expected.iter_mut() {
                if pending.is_empty() {
                    continue;
                }
                let candidate = pending.remove(rng.gen_range(0..pending.len()));
                available -= 1;
                picked.push((candidate, cluster.clone()));
            }
        }
        log::debug!(
            "initial mapping with seed {seed}: {} of {candidates} candidates picked",
            picked.len()
        );
        Ok(picked)
    }
}
