use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use phenosim::annotations::Annotations;
use phenosim::stats::test_group_similarity;
use phenosim::{Ontology, SimilarityGraph, SimilarityMetric, TermId};

fn tallied_graph() -> (SimilarityGraph, Annotations) {
    let ontology = Ontology::from_obo_file("tests/small.obo").unwrap();
    let terms = [
        "XX:0000002",
        "XX:0000003",
        "XX:0000004",
        "XX:0000005",
    ];

    let mut annotations = Annotations::new();
    for i in 0..100usize {
        let list: Vec<TermId> = (0..=i % 3)
            .map(|j| TermId::from(terms[(i + j) % terms.len()]))
            .collect();
        annotations.insert(format!("person_{i:03}"), list);
    }

    let mut graph = SimilarityGraph::new(ontology);
    graph.tally(&annotations).unwrap();
    graph.precompute();
    (graph, annotations)
}

fn pairwise_scores(graph: &SimilarityGraph, annotations: &Annotations, metric: SimilarityMetric) -> f64 {
    let mut total = 0.0;
    for (_, a) in annotations.iter() {
        for (_, b) in annotations.iter() {
            total += metric.pairwise(graph, a, b);
        }
    }
    total
}

fn metrics_benchmark(c: &mut Criterion) {
    let (graph, annotations) = tallied_graph();

    for metric in [
        SimilarityMetric::Resnik,
        SimilarityMetric::Lin,
        SimilarityMetric::SimGic,
    ] {
        c.bench_function(&format!("pairwise {metric} 100x100"), |b| {
            b.iter(|| pairwise_scores(black_box(&graph), black_box(&annotations), metric))
        });
    }
}

fn permutation_benchmark(c: &mut Criterion) {
    let (graph, annotations) = tallied_graph();
    let members: Vec<String> = (0..5).map(|i| format!("person_{i:03}")).collect();

    c.bench_function("permutation test 1000 iterations", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            test_group_similarity(
                black_box(&graph),
                black_box(&annotations),
                black_box(&members),
                1000,
                SimilarityMetric::Resnik,
                &mut rng,
            )
        })
    });
}

criterion_group!(similarity, metrics_benchmark, permutation_benchmark);
criterion_main!(similarity);
