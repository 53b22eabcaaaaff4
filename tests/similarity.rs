//! End-to-end run of the full analysis pipeline on the bundled ontology
use rand::rngs::StdRng;
use rand::SeedableRng;

use phenosim::annotations::{Annotations, Groups};
use phenosim::stats::{analyse_groups, TestOutcome, TABLE_HEADER};
use phenosim::{Ontology, SimilarityGraph, SimilarityMetric, TermId};

fn id(s: &str) -> TermId {
    TermId::from(s)
}

#[test]
fn obo_file_to_p_values() {
    let ontology = Ontology::from_obo_file("tests/small.obo").expect("fixture must parse");
    assert_eq!(ontology.len(), 5);

    let mut annotations = Annotations::new();
    // XX:0000006 is obsolete and XX:0009002 is an alternate of XX:0000002;
    // normalization must clean both up before tallying
    annotations.insert("p1", vec![id("XX:0000004"), id("XX:0000006")]);
    annotations.insert("p2", vec![id("XX:0009002"), id("XX:0000005")]);
    annotations.insert("p3", vec![id("XX:0000003"), id("XX:0000005")]);
    annotations.insert("p4", vec![id("XX:0000003"), id("XX:0000005")]);
    annotations.insert("p5", vec![id("XX:0000003"), id("XX:0000005")]);
    annotations.normalize(&ontology);
    assert_eq!(
        annotations.get("p2"),
        Some(&[id("XX:0000002"), id("XX:0000005")][..])
    );

    let mut graph = SimilarityGraph::new(ontology);
    graph.tally(&annotations).expect("all terms resolve");
    graph.precompute();
    assert_eq!(graph.total_annotations(), 9);

    let mut groups = Groups::new();
    groups.insert("GENE_A", vec![String::from("p4"), String::from("p5")]);
    groups.insert("GENE_B", vec![String::from("p1")]);

    let mut rng = StdRng::seed_from_u64(2026);
    let results = analyse_groups(
        &graph,
        &annotations,
        &groups,
        1000,
        SimilarityMetric::Resnik,
        &mut rng,
    );

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].label(), "GENE_A");
    let p = results[0].outcome().p_value().expect("group is testable");
    assert!((p - 1.0 / 3.0).abs() < 0.05, "p = {p}");
    assert_eq!(results[1].outcome(), &TestOutcome::NotTested);

    // output rows line up with the table header
    assert_eq!(TABLE_HEADER.split('\t').count(), 2);
    let row = results[0].as_row();
    let mut fields = row.split('\t');
    assert_eq!(fields.next(), Some("GENE_A"));
    let printed: f64 = fields.next().expect("p-value field").parse().unwrap();
    assert!((printed - p).abs() < 1e-12);
    assert_eq!(results[1].as_row(), "GENE_B\tnot_tested");
}

#[test]
fn permuted_groups_stay_testable() {
    let ontology = Ontology::from_obo_file("tests/small.obo").unwrap();
    let mut annotations = Annotations::new();
    annotations.insert("p1", vec![id("XX:0000004")]);
    annotations.insert("p2", vec![id("XX:0000002"), id("XX:0000005")]);
    annotations.insert("p3", vec![id("XX:0000003"), id("XX:0000005")]);
    annotations.insert("p4", vec![id("XX:0000003"), id("XX:0000005")]);
    annotations.insert("p5", vec![id("XX:0000003"), id("XX:0000005")]);

    let mut graph = SimilarityGraph::new(ontology);
    graph.tally(&annotations).unwrap();

    let mut groups = Groups::new();
    groups.insert("GENE_A", vec![String::from("p4"), String::from("p5")]);
    groups.insert("GENE_B", vec![String::from("p1"), String::from("p2")]);

    let mut rng = StdRng::seed_from_u64(7);
    let permuted = phenosim::annotations::permute_groups(&groups, &mut rng).unwrap();

    let results = analyse_groups(
        &graph,
        &annotations,
        &permuted,
        200,
        SimilarityMetric::SimGic,
        &mut rng,
    );
    for result in &results {
        assert!(
            result.outcome().p_value().is_some(),
            "{} should stay testable",
            result.label()
        );
    }
}
