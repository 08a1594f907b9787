use pretty_assertions::assert_eq;
use reflexion_graph::{ChangeEvent, ChangeType, ReflexionGraph, State};

const GRAPH: &str = r#"{
    "nodes": [
        {"id": "A", "type": "Cluster", "subgraph": "architecture"},
        {"id": "B", "type": "Cluster", "subgraph": "architecture"},
        {"id": "pkg", "type": "Package", "subgraph": "implementation"},
        {"id": "x", "type": "Class", "subgraph": "implementation", "parent": "pkg"},
        {"id": "y", "type": "Class", "subgraph": "implementation"}
    ],
    "edges": [
        {"id": "x-y", "source": "x", "target": "y", "type": "Call"}
    ],
    "mapping": [
        {"node": "y", "cluster": "B"}
    ]
}"#;

fn load() -> ReflexionGraph {
    ReflexionGraph::from_json(GRAPH).expect("graph spec should load")
}

#[test]
fn loading_records_no_events() {
    let graph = load();
    assert!(graph.pending_events().is_empty());
    assert_eq!(graph.node_count(), 5);
    let y = graph.node_index("y").unwrap();
    assert_eq!(graph.maps_to(y), graph.node_index("B"));
}

#[test]
fn mapping_ancestor_reports_state_of_inner_edges() {
    let mut graph = load();
    let a = graph.node_index("A").unwrap();
    let pkg = graph.node_index("pkg").unwrap();

    graph.add_to_mapping(pkg, a).unwrap();

    assert_eq!(
        graph.take_events(),
        vec![
            ChangeEvent::MapsTo {
                node: "pkg".to_string(),
                cluster: "A".to_string(),
                change: ChangeType::Addition,
            },
            ChangeEvent::EdgeState {
                edge: "x-y".to_string(),
                old: State::Unmapped,
                new: State::Divergent,
            },
        ]
    );
}

#[test]
fn architecture_edge_events_surround_state_changes() {
    let mut graph = load();
    let a = graph.node_index("A").unwrap();
    let b = graph.node_index("B").unwrap();
    let pkg = graph.node_index("pkg").unwrap();
    graph.add_to_mapping(pkg, a).unwrap();
    graph.clear_events();

    let dep = graph.add_edge_with_id("A-B", a, b, "Source_Dependency").unwrap();
    let added = graph.take_events();
    assert!(matches!(
        &added[0],
        ChangeEvent::ArchitectureEdge { change: ChangeType::Addition, edge } if edge.id == "A-B"
    ));
    assert_eq!(
        added[1],
        ChangeEvent::EdgeState {
            edge: "x-y".to_string(),
            old: State::Divergent,
            new: State::Allowed,
        }
    );
    assert_eq!(graph.edge_state(dep), State::Convergent);

    let snapshot = graph.remove_edge(dep).unwrap();
    assert_eq!(snapshot.source, "A");
    let removed = graph.take_events();
    assert!(matches!(removed[0], ChangeEvent::EdgeState { new: State::Divergent, .. }));
    assert!(matches!(
        removed.last(),
        Some(ChangeEvent::ArchitectureEdge { change: ChangeType::Removal, .. })
    ));
}

#[test]
fn suppressed_notifications_record_nothing() {
    let mut graph = load();
    let a = graph.node_index("A").unwrap();
    let pkg = graph.node_index("pkg").unwrap();

    graph.set_suppress_notifications(true);
    graph.add_to_mapping(pkg, a).unwrap();
    graph.set_suppress_notifications(false);

    assert!(graph.pending_events().is_empty());
    assert_eq!(graph.maps_to(graph.node_index("x").unwrap()), Some(a));
}

#[test]
fn removing_cluster_unmaps_its_nodes_first() {
    let mut graph = load();
    let b = graph.node_index("B").unwrap();
    let y = graph.node_index("y").unwrap();

    graph.remove_architecture_node(b).unwrap();

    let events = graph.take_events();
    assert_eq!(
        events.first(),
        Some(&ChangeEvent::MapsTo {
            node: "y".to_string(),
            cluster: "B".to_string(),
            change: ChangeType::Removal,
        })
    );
    assert_eq!(
        events.last(),
        Some(&ChangeEvent::ArchitectureNode {
            node: "B".to_string(),
            change: ChangeType::Removal,
        })
    );
    assert_eq!(graph.maps_to(y), None);
    assert!(graph.node_index("B").is_none());
}

#[test]
fn implementation_nodes_cannot_be_removed() {
    let mut graph = load();
    let y = graph.node_index("y").unwrap();
    assert!(graph.remove_architecture_node(y).is_err());
}

#[test]
fn spec_keeps_explicit_mapping() {
    let graph = load();
    let spec = graph.to_spec();
    assert_eq!(spec.mapping.len(), 1);
    assert_eq!(spec.mapping[0].node, "y");

    let reloaded = ReflexionGraph::from_spec(&spec).unwrap();
    assert_eq!(reloaded.to_spec(), spec);
}
