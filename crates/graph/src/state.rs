use crate::event::ChangeEvent;
use crate::types::{ReflexionGraph, State, Subgraph};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::collections::HashSet;

impl ReflexionGraph {
    /// State of an edge under the current mapping.
    ///
    /// Implementation edges: `Unmapped` if an endpoint is unmapped, `Allowed` if an
    /// architecture dependency covers the mapped endpoints, `ImplicitlyAllowed`
    /// inside one cluster or towards an enclosing cluster, else `Divergent`.
    /// Architecture edges: `Convergent` or `Absent`.
    pub fn edge_state(&self, edge: EdgeIndex) -> State {
        let (Some(data), Some((source, target))) =
            (self.graph.edge_weight(edge), self.graph.edge_endpoints(edge))
        else {
            return State::Undefined;
        };

        match data.subgraph {
            Subgraph::Implementation => self.implementation_state(source, target),
            Subgraph::Architecture => self.architecture_state(edge),
        }
    }

    fn implementation_state(&self, source: NodeIndex, target: NodeIndex) -> State {
        let (Some(source_cluster), Some(target_cluster)) =
            (self.maps_to(source), self.maps_to(target))
        else {
            return State::Unmapped;
        };
        self.state_between_clusters(source_cluster, target_cluster)
    }

    /// State an implementation dependency from `source_cluster` to `target_cluster` would have
    pub fn state_between_clusters(&self, source_cluster: NodeIndex, target_cluster: NodeIndex) -> State {
        if !self.specifying_dependencies(source_cluster, target_cluster).is_empty() {
            State::Allowed
        } else if source_cluster == target_cluster {
            State::ImplicitlyAllowed
        } else if self.allow_dependencies_to_parents
            && self.is_descendant_of(source_cluster, target_cluster)
        {
            State::ImplicitlyAllowed
        } else {
            State::Divergent
        }
    }

    fn architecture_state(&self, edge: EdgeIndex) -> State {
        let convergent = self.all_implementation_edges().into_iter().any(|impl_edge| {
            let Some((source, target)) = self.graph.edge_endpoints(impl_edge) else {
                return false;
            };
            match (self.maps_to(source), self.maps_to(target)) {
                (Some(sc), Some(tc)) => self.specifying_dependencies(sc, tc).first() == Some(&edge),
                _ => false,
            }
        });
        if convergent {
            State::Convergent
        } else {
            State::Absent
        }
    }

    /// Architecture dependencies allowing a dependency from `source_cluster` to `target_cluster`.
    ///
    /// Walks from `source_cluster` upwards and collects every dependency whose
    /// target is `target_cluster` or one of its ancestors. The first entry is the
    /// nearest match; edge types are not compared.
    pub fn specifying_dependencies(
        &self,
        source_cluster: NodeIndex,
        target_cluster: NodeIndex,
    ) -> Vec<EdgeIndex> {
        let targets: HashSet<NodeIndex> = self.ancestors_or_self(target_cluster).into_iter().collect();
        let mut result = Vec::new();
        for cursor in self.ancestors_or_self(source_cluster) {
            for edge in self.outgoings(cursor) {
                let is_architecture = self
                    .graph
                    .edge_weight(edge)
                    .is_some_and(|e| e.subgraph == Subgraph::Architecture);
                let hits_target = self
                    .graph
                    .edge_endpoints(edge)
                    .is_some_and(|(_, t)| targets.contains(&t));
                if is_architecture && hits_target {
                    result.push(edge);
                }
            }
        }
        result
    }

    pub(crate) fn states_of(&self, edges: &[EdgeIndex]) -> Vec<(EdgeIndex, State)> {
        edges.iter().map(|&e| (e, self.edge_state(e))).collect()
    }

    /// States of all implementation edges, recorded only when an architecture
    /// change will be notified
    pub(crate) fn states_before_architecture_change(
        &self,
        subgraph: Subgraph,
    ) -> Vec<(EdgeIndex, State)> {
        if subgraph != Subgraph::Architecture || self.suppress_notifications {
            return Vec::new();
        }
        self.states_of(&self.all_implementation_edges())
    }

    /// Record an `EdgeState` event for every edge whose state differs from `before`
    pub(crate) fn notify_state_changes(&mut self, before: Vec<(EdgeIndex, State)>) {
        for (edge, old) in before {
            let new = self.edge_state(edge);
            if new == old {
                continue;
            }
            let Some(id) = self.graph.edge_weight(edge).map(|e| e.id.clone()) else {
                continue;
            };
            self.notify(ChangeEvent::EdgeState { edge: id, old, new });
        }
    }
}
