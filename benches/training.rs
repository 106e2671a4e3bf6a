use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forgeml::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

fn create_regression_table(n_rows: usize, n_features: usize) -> Table {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let features: Vec<Vec<f64>> = (0..n_features)
        .map(|_| (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect())
        .collect();

    // target is the sum of the features plus noise
    let target: Vec<f64> = (0..n_rows)
        .map(|i| features.iter().map(|f| f[i]).sum::<f64>() + rng.gen::<f64>() * 0.1)
        .collect();

    let mut columns: Vec<Column> = features
        .iter()
        .enumerate()
        .map(|(i, values)| Column::from_f64(format!("feature_{}", i), values))
        .collect();
    let cities: Vec<&str> = (0..n_rows).map(|i| ["a", "b", "c", "d"][i % 4]).collect();
    columns.push(Column::from_strs("city", &cities));
    columns.push(Column::from_f64("target", &target));
    Table::new(columns).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [1000, 5000].iter() {
        let table = create_regression_table(*n_rows, 10);
        for algorithm in ["lin_reg", "rf_reg"] {
            group.bench_with_input(
                BenchmarkId::new(algorithm, n_rows),
                &table,
                |b, table| {
                    let trainer = Trainer::new(TrainingConfig::default().with_n_estimators(20));
                    b.iter(|| {
                        trainer
                            .train(black_box(table), "target", algorithm, ProblemType::Regression)
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let table = create_regression_table(5000, 10);
    let (_, pipeline) = Trainer::new(TrainingConfig::default().with_n_estimators(20))
        .train(&table, "target", "rf_reg", ProblemType::Regression)
        .unwrap();
    let inputs = table.without_column("target");

    for batch in [10, 100, 1000].iter() {
        let rows: Vec<usize> = (0..*batch).collect();
        let input = inputs.take_rows(&rows);
        group.bench_with_input(BenchmarkId::new("predict", batch), &input, |b, input| {
            b.iter(|| pipeline.predict(black_box(input)).unwrap())
        });
    }

    group.finish();
}

fn bench_transforms(c: &mut Criterion) {
    let table = create_regression_table(10_000, 10);
    let steps: Vec<StepSpec> = serde_json::from_value(json!([
        {"type": "cleaning", "action": "drop_duplicates"},
        {"type": "preprocessing", "action": "scale",
            "params": {"columns": ["feature_0", "feature_1", "feature_2"], "method": "standard"}},
        {"type": "preprocessing", "action": "encode", "params": {"columns": ["city"], "method": "onehot"}}
    ]))
    .unwrap();
    let engine = TransformEngine::new();

    c.bench_function("transforms/apply", |b| {
        b.iter(|| engine.apply(black_box(&table), &steps).unwrap())
    });
}

criterion_group!(benches, bench_training, bench_prediction, bench_transforms);
criterion_main!(benches);
