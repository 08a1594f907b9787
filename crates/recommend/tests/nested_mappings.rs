mod support;

use pretty_assertions::assert_eq;
use reflexion_recommend::{AttractFunction, MergingType, RecommendationSettings};
use support::{adc_settings, count_settings, naive_bayes_settings, pair, reader, Fixture};

#[derive(Debug, Clone, Copy)]
enum Step {
    Map(usize, usize),
    Unmap(usize),
}

use Step::{Map, Unmap};

/// Parent 1 { 2 } and a free node 3, dependency 2 -> 3, architecture A1 -> A2
fn fixture(settings: RecommendationSettings) -> Fixture {
    let mut fixture = Fixture::new(2, &[(1, 2)], 3, &[(2, 3)]).with_hierarchy(&[(2, 1)]);
    fixture.configure(settings, reader(&[(3, "word2")]));
    fixture
}

fn all_settings() -> Vec<RecommendationSettings> {
    vec![
        count_settings(0.5),
        naive_bayes_settings(),
        adc_settings(MergingType::Union),
        adc_settings(MergingType::Intersection),
    ]
}

fn orders() -> Vec<Vec<Step>> {
    vec![
        vec![Map(1, 1), Map(2, 2), Unmap(1), Unmap(2)],
        vec![Map(1, 1), Map(2, 2), Unmap(2), Unmap(1)],
        vec![Map(2, 2), Map(1, 1), Unmap(2), Unmap(1)],
        vec![Map(2, 2), Map(1, 1), Unmap(1), Unmap(2)],
        vec![Map(1, 1), Map(2, 1), Unmap(1), Map(1, 2), Unmap(2), Unmap(1)],
    ]
}

fn assert_untrained(fixture: &mut Fixture, context: &str) {
    assert!(fixture.empty_training_data(), "{context}");
    for node in 1..=3 {
        for cluster in 1..=2 {
            assert_eq!(fixture.attraction(node, cluster), 0.0, "{context}: {node} -> A{cluster}");
        }
    }
    assert!(fixture.recommended().is_empty(), "{context}");
}

#[test]
fn unmapping_everything_forgets_all_training() {
    for settings in all_settings() {
        for steps in orders() {
            let mut fixture = fixture(settings.clone());
            for &step in &steps {
                match step {
                    Map(node, cluster) => fixture.map(node, cluster),
                    Unmap(node) => fixture.unmap(node),
                }
            }
            let context = format!("{} {steps:?}", settings.attract.kind());
            assert_untrained(&mut fixture, &context);
        }
    }
}

#[test]
fn batched_changes_forget_all_training() {
    for settings in all_settings() {
        for steps in orders() {
            let mut fixture = fixture(settings.clone());
            for &step in &steps {
                match step {
                    Map(node, cluster) => fixture.stage_map(node, cluster),
                    Unmap(node) => fixture.stage_unmap(node),
                }
            }
            fixture.update();
            let context = format!("batched {} {steps:?}", settings.attract.kind());
            assert_untrained(&mut fixture, &context);
        }
    }
}

#[test]
fn nested_mapping_counts_a_dependency_once() {
    let mut fixture = fixture(count_settings(0.5));
    fixture.map(1, 1);
    fixture.map(2, 2);

    let overall = match fixture.recommendations().attract_function() {
        AttractFunction::Count(count) => count.overall(&fixture.graph, fixture.i(3)),
        other => panic!("unexpected attract function {}", other.kind()),
    };
    assert_eq!(overall, 1.0);
    // 2 -> 3 would run A2 -> A1, which the architecture does not allow
    assert_eq!(fixture.attraction(3, 1), 0.0);
    assert_eq!(fixture.attraction(3, 2), 1.0);
    assert_eq!(fixture.recommended(), vec![pair("3", "A2")]);

    fixture.unmap(1);
    assert_eq!(fixture.attraction(3, 2), 1.0);
    fixture.unmap(2);
    assert_eq!(fixture.attraction(3, 2), 0.0);
}

fn documents(fixture: &Fixture) -> (usize, usize) {
    match fixture.recommendations().attract_function() {
        AttractFunction::NaiveBayes(nb) => (
            nb.classifier().document_count("A1"),
            nb.classifier().document_count("A2"),
        ),
        other => panic!("unexpected attract function {}", other.kind()),
    }
}

#[test]
fn nested_mapping_moves_documents_between_classes() {
    let mut fixture = fixture(naive_bayes_settings());

    fixture.map(1, 1);
    assert_eq!(documents(&fixture), (2, 0));

    fixture.map(2, 2);
    assert_eq!(documents(&fixture), (1, 1));

    // 2 falls back to the cluster of its parent
    fixture.unmap(2);
    assert_eq!(documents(&fixture), (2, 0));

    fixture.map(2, 2);
    fixture.unmap(1);
    assert_eq!(documents(&fixture), (0, 1));
}
