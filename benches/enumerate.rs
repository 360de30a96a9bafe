use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use causal_adjust::{AdjustmentEngine, AdjustmentQuery, EngineConfig, MixedGraph};

/// `layers` rows of `width` confounders; each row feeds the next and the
/// first row feeds both X and Y, so every row offers alternative blockers.
fn layered_graph(layers: usize, width: usize) -> MixedGraph {
    let mut edges = vec!["X --> Y".to_string()];
    for i in 0..width {
        edges.push(format!("L0_{i} --> X"));
        edges.push(format!("L0_{i} --> Y"));
    }
    for l in 1..layers {
        for i in 0..width {
            edges.push(format!("L{l}_{i} --> L{}_{i}", l - 1));
            edges.push(format!("L{l}_{i} --> L{}_{}", l - 1, (i + 1) % width));
        }
    }
    MixedGraph::from_edges(edges).unwrap()
}

fn bench_enumerate(c: &mut Criterion) {
    let query = AdjustmentQuery::builder()
        .treatment("X")
        .outcome("Y")
        .max_num_sets(20)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("enumerate");
    group.throughput(Throughput::Elements(1));
    for (layers, width) in [(3, 4), (6, 6), (10, 8)] {
        let graph: Arc<MixedGraph> = Arc::new(layered_graph(layers, width));
        for parallelism in [1, 4] {
            let config = EngineConfig {
                parallelism,
                ..EngineConfig::default()
            };
            let engine = AdjustmentEngine::with_config(graph.clone(), config).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{layers}x{width}"), parallelism),
                &engine,
                |b, engine| b.iter(|| engine.adjustment_sets(&query).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_enumerate);
criterion_main!(benches);
