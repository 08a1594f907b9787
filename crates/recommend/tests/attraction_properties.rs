mod support;

use pretty_assertions::assert_eq;
use reflexion_graph::NodeIndex;
use reflexion_recommend::{
    AttractConfig, MergingType, NaiveBayesConfig, NaiveBayesIncremental, TextClassifier,
};
use reflexion_terms::Document;
use support::{adc_settings, count_settings, naive_bayes_settings, pair, reader, Fixture};

fn mapping_of(fixture: &Fixture) -> Vec<(String, Option<NodeIndex>)> {
    fixture
        .graph
        .nodes()
        .map(|(idx, node)| (node.id.clone(), fixture.graph.maps_to(idx)))
        .collect()
}

fn hierarchical_fixture() -> Fixture {
    Fixture::new(2, &[(1, 2)], 6, &[(1, 4), (5, 2), (6, 3), (3, 1)])
        .with_hierarchy(&[(5, 4), (6, 4)])
}

#[test]
fn attraction_leaves_the_mapping_untouched() {
    let mut settings = naive_bayes_settings();
    settings.attract = AttractConfig::NaiveBayes(NaiveBayesConfig {
        use_cda: true,
        ..Default::default()
    });

    for settings in [count_settings(0.5), adc_settings(MergingType::Union), settings] {
        let mut fixture = hierarchical_fixture();
        fixture.configure(settings, reader(&[(3, "word2")]));
        fixture.map(1, 1);
        fixture.map(2, 2);
        fixture.map(3, 1);

        let before = mapping_of(&fixture);
        for node in [4, 5, 6] {
            for cluster in 1..=2 {
                fixture.attraction(node, cluster);
            }
        }
        assert_eq!(mapping_of(&fixture), before);
        assert!(fixture.graph.pending_events().is_empty());
    }
}

#[test]
fn mapped_candidates_are_never_recommended() {
    let mut fixture = Fixture::new(2, &[(1, 2)], 2, &[(1, 2)]);
    fixture.configure(count_settings(1.0), reader(&[]));
    fixture.map(2, 2);
    assert_eq!(fixture.recommended(), vec![pair("1", "A2")]);

    fixture.map(1, 2);
    assert!(fixture.recommended().is_empty());
    assert!(fixture.recommendations().mapping_pairs().is_empty());
    assert_eq!(fixture.recommendations().definite_recommendation(), None);
}

#[test]
fn class_with_matching_words_scores_higher() {
    let mut classifier = NaiveBayesIncremental::default();
    classifier.add_document("A", &Document::from_words(["x", "x", "x"]));
    classifier.add_document("B", &Document::from_words(["y", "y"]));

    let query = Document::from_words(["x"]);
    assert!(classifier.probability_for_class("A", &query) > classifier.probability_for_class("B", &query));
    assert_eq!(classifier.classify_document(&query).as_deref(), Some("A"));

    classifier.delete_class("B").unwrap();
    assert!(classifier.vocabulary_consistent());
}

#[test]
fn allowed_dependency_elsewhere_cancels_out_with_full_phi() {
    // x -> y with y in B, A -> B allowed; x gains 1 overall and loses 1 towards A
    let mut fixture = Fixture::new(2, &[(1, 2)], 2, &[(1, 2)]);
    fixture.configure(count_settings(1.0), reader(&[]));
    fixture.map(2, 2);

    assert_eq!(fixture.attraction(1, 1), 0.0);
    assert_eq!(fixture.attraction(1, 2), 1.0);
    assert_eq!(fixture.recommended(), vec![pair("1", "A2")]);
}
