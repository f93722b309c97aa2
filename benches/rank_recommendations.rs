//! Benchmarks for the prediction path: forest inference and district ranking
//!
//! Run with: cargo bench --bench rank_recommendations

use agriguru::{rank_recommendations, ClassProbabilities, ForestParams, RandomForest};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const LABELS: [&str; 11] = [
    "Barley", "Cotton", "Ground Nuts", "Maize", "Millets", "Oil seeds", "Paddy", "Pulses",
    "Sugarcane", "Tobacco", "Wheat",
];

fn synthetic_training(n: usize) -> (Vec<Vec<f64>>, Vec<&'static str>) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % LABELS.len();
        let base = label as f64 * 4.0;
        let jitter = ((i * 7919) % 13) as f64 * 0.1;
        x.push(vec![
            base + jitter,
            base * 0.5 + jitter,
            40.0 - base + jitter,
            25.0 + jitter,
            50.0 + base * 0.3,
            30.0 + jitter * 2.0,
            (label % 5) as f64,
        ]);
        y.push(LABELS[label]);
    }
    (x, y)
}

fn bench_forest(c: &mut Criterion) {
    let (x, y) = synthetic_training(500);

    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);
    for n_trees in [10, 100].iter() {
        let params = ForestParams {
            n_trees: *n_trees,
            ..ForestParams::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(n_trees), &params, |b, params| {
            b.iter(|| black_box(RandomForest::fit(&x, &y, params).unwrap()));
        });
    }
    group.finish();

    let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
    let row = [12.3, 6.1, 28.0, 25.5, 53.0, 31.0, 3.0];
    c.bench_function("forest_predict_proba", |b| {
        b.iter(|| black_box(forest.predict_proba_raw(black_box(&row)).unwrap()));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let labels: Vec<String> = LABELS.iter().map(|l| l.to_string()).collect();
    let values: Vec<f64> = (1..=LABELS.len()).map(|i| i as f64 / 66.0).collect();
    let probs = ClassProbabilities::new(&labels, &values).unwrap();

    let mut group = c.benchmark_group("rank_recommendations");
    for size in [5, 50, 500].iter() {
        // District crop lists repeat and mostly miss the label set
        let district: Vec<String> = (0..*size)
            .map(|i| match i % 4 {
                0 => LABELS[i % LABELS.len()].to_string(),
                _ => format!("Local crop {}", i),
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &district, |b, district| {
            b.iter(|| black_box(rank_recommendations(&probs, district)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forest, bench_ranking);
criterion_main!(benches);
