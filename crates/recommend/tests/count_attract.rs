mod support;

use pretty_assertions::assert_eq;
use support::{count_settings, pair, reader, Fixture};

/// Architecture A1 -> A2, implementation 4 -> 1, 4 -> 2, 4 -> 3
fn fixture() -> Fixture {
    let mut fixture = Fixture::new(2, &[(1, 2)], 4, &[(4, 1), (4, 2), (4, 3)]);
    fixture.configure(count_settings(1.0), reader(&[]));
    fixture
}

fn assert_recommended_for(fixture: &Fixture, clusters: &[usize]) {
    let expected: Vec<(String, String)> = clusters.iter().map(|c| pair("4", &format!("A{c}"))).collect();
    assert_eq!(fixture.recommended_for(fixture.i(4)), expected);
    for cluster in 1..=2 {
        let for_cluster = fixture.recommended_for(fixture.a(cluster));
        if clusters.contains(&cluster) {
            assert_eq!(for_cluster, vec![pair("4", &format!("A{cluster}"))]);
        } else {
            assert!(for_cluster.is_empty(), "A{cluster}: {for_cluster:?}");
        }
    }
}

#[test]
fn recommendations_follow_the_mapping() {
    let mut fixture = fixture();

    fixture.map(1, 1);
    fixture.map(2, 2);
    assert_recommended_for(&fixture, &[1, 2]);

    fixture.map(3, 1);
    assert_recommended_for(&fixture, &[1]);

    fixture.unmap(3);
    assert_recommended_for(&fixture, &[1, 2]);

    fixture.map(3, 2);
    assert_recommended_for(&fixture, &[2]);
}

#[test]
fn phi_weighs_allowed_dependencies() {
    let mut fixture = fixture();
    fixture.map(1, 1);
    fixture.map(2, 2);
    fixture.map(3, 2);

    // attraction(4, A1) = 3 - 2 * phi, attraction(4, A2) = 3 - 1
    fixture.configure(count_settings(0.6), reader(&[]));
    assert_recommended_for(&fixture, &[2]);
    assert!((fixture.attraction(4, 1) - 1.8).abs() < 1e-9);

    fixture.configure(count_settings(0.5), reader(&[]));
    assert_recommended_for(&fixture, &[1, 2]);

    fixture.configure(count_settings(0.4), reader(&[]));
    assert_recommended_for(&fixture, &[1]);
    assert_eq!(fixture.attraction(4, 2), 2.0);
}

#[test]
fn architecture_changes_are_picked_up() {
    let mut fixture = fixture();
    fixture.map(1, 1);
    fixture.map(2, 2);
    fixture.map(3, 2);
    fixture.configure(count_settings(0.4), reader(&[]));
    assert_recommended_for(&fixture, &[1]);

    // without A1 -> A2 both dependencies into A2 count fully
    let removed = fixture.remove_architecture_edges();
    assert_recommended_for(&fixture, &[2]);

    fixture.restore_edges(&removed);
    assert_recommended_for(&fixture, &[1]);

    let a1 = fixture.a(1);
    fixture.graph.remove_architecture_node(a1).unwrap();
    fixture.update();
    assert_eq!(fixture.recommended(), vec![pair("4", "A2")]);
    let remaining = fixture.recommendations().mapping_pair("4", "A2").unwrap();
    assert_eq!(remaining.attraction_value(), 2.0);
    assert!(fixture.recommendations().mapping_pair("4", "A1").is_none());

    fixture.graph.reset_mapping().unwrap();
    fixture.update();
    assert!(fixture.recommendations().automatic_mappings().is_empty());
    assert!(fixture.empty_training_data());
}

#[test]
fn weighted_dependencies_of_subtrees() {
    // A2 -> A1, A2 -> A3; 1 { 2, 3 }, 4 { 5, 6 }, 7 { 8 }
    let mut fixture = Fixture::new(3, &[(2, 1), (2, 3)], 8, &[(5, 1), (6, 5)])
        .with_hierarchy(&[(2, 1), (3, 1), (5, 4), (6, 4), (8, 7)]);
    fixture.add_impl_edges(&[(6, 3), (6, 2), (6, 8)], "Use");
    fixture.configure(count_settings(1.0).with_edge_weight("Use", 2.0), reader(&[]));

    fixture.map(1, 1);
    fixture.map(7, 3);

    // 5 -> 1 (1) and 6 -> 2, 6 -> 3 (2 each) go into A1, 6 -> 8 (2) goes to A3
    assert_eq!(fixture.attraction(4, 1), 5.0);

    fixture.unmap(1);
    assert_eq!(fixture.attraction(4, 1), 0.0);
}

#[test]
fn none_attract_recommends_nothing() {
    let mut fixture = fixture();
    let mut settings = count_settings(1.0);
    settings.attract = reflexion_recommend::AttractConfig::None;
    fixture.configure(settings, reader(&[]));

    fixture.map(1, 1);
    fixture.map(2, 2);

    assert_eq!(fixture.attraction(4, 1), 0.0);
    assert!(fixture.recommended().is_empty());
    assert!(fixture.empty_training_data());
}
