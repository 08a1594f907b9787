mod support;

use support::{naive_bayes_settings, reader, Fixture};

const TOLERANCE: f64 = 1e-5;

fn fixture() -> Fixture {
    let mut fixture = Fixture::new(3, &[], 5, &[]);
    fixture.configure(
        naive_bayes_settings(),
        reader(&[(1, "word1"), (2, "word1"), (3, "word1"), (4, "word1 word2"), (5, "word2")]),
    );
    fixture.map(1, 1);
    fixture.map(2, 2);
    fixture.map(3, 3);
    fixture
}

#[test]
fn equally_trained_clusters_attract_equally() {
    let mut fixture = fixture();

    // every class holds one document {word1}; the package name adds "implement" to queries
    // P(A) * P(word2 | A) * P(implement | A) = 1/3 * 1/4 * 1/4
    for cluster in 1..=3 {
        let value = fixture.probability(5, cluster);
        assert!((value - 1.0 / 48.0).abs() < TOLERANCE, "5 -> A{cluster}: {value}");
    }
    // P(A) * P(word1 | A) * P(word2 | A) * P(implement | A) = 1/3 * 2/4 * 1/4 * 1/4
    for cluster in 1..=3 {
        let value = fixture.probability(4, cluster);
        assert!((value - 1.0 / 96.0).abs() < TOLERANCE, "4 -> A{cluster}: {value}");
    }
}

#[test]
fn mapping_shifts_attraction_to_the_trained_cluster() {
    let mut fixture = fixture();

    fixture.map(4, 1);
    let (to_a1, to_a2, to_a3) = (fixture.probability(5, 1), fixture.probability(5, 2), fixture.probability(5, 3));
    assert!(to_a1 > to_a2);
    assert!(to_a1 > to_a3);
    assert!((to_a2 - to_a3).abs() < 1e-4);

    fixture.unmap(4);
    fixture.map(4, 2);
    let (to_a1, to_a2, to_a3) = (fixture.probability(5, 1), fixture.probability(5, 2), fixture.probability(5, 3));
    assert!(to_a2 > to_a1);
    assert!(to_a2 > to_a3);
    assert!((to_a1 - to_a3).abs() < 1e-4);
}

#[test]
fn recommendations_follow_the_classifier() {
    let mut fixture = fixture();
    fixture.map(4, 2);

    let best = fixture
        .recommended_for(fixture.i(5))
        .into_iter()
        .map(|(_, cluster)| cluster)
        .collect::<Vec<_>>();
    assert_eq!(best, vec!["A2".to_string()]);
}

#[test]
fn unmapping_everything_empties_the_classifier() {
    let mut fixture = fixture();
    assert!(!fixture.empty_training_data());

    fixture.graph.reset_mapping().unwrap();
    fixture.update();

    assert!(fixture.empty_training_data());
    assert!(fixture.recommended().is_empty());
}
