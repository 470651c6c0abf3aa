//! Pipeline stage benchmarks: profiling, cleaning, feature encoding and
//! training.

use benchtop::{
    CleaningConfig, CleaningEngine, Column, FeatureConfig, FeaturePipelineBuilder, ModelFamily,
    Profiler, Table, Trainer, TrainingConfig,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Synthetic table with numeric and categorical features, gaps and a
/// binary label.
fn generate_table(rows: usize) -> Table {
    Table::new(vec![
        Column::numeric(
            "age",
            (0..rows).map(|i| if i % 13 == 0 { None } else { Some(20.0 + (i % 50) as f64) }),
        ),
        Column::numeric("income", (0..rows).map(|i| Some(1_000.0 + ((i * 37) % 900) as f64))),
        Column::text(
            "region",
            (0..rows).map(|i| {
                if i % 11 == 0 {
                    None
                } else {
                    Some(["north", "south", "east", "west"][i % 4])
                }
            }),
        ),
        Column::text(
            "label",
            (0..rows).map(|i| {
                Some(if (i % 50) + ((i * 37) % 900) / 30 > 40 {
                    "yes"
                } else {
                    "no"
                })
            }),
        ),
    ])
    .unwrap()
}

fn bench_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile");
    let profiler = Profiler::new();

    for rows in [1_000, 10_000].iter() {
        let table = generate_table(*rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            b.iter(|| profiler.profile(black_box(table)))
        });
    }

    group.finish();
}

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean");
    let engine = CleaningEngine::new();
    let config = CleaningConfig::default().with_cap_outliers(true);

    for rows in [1_000, 10_000].iter() {
        let table = generate_table(*rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            b.iter(|| engine.clean(black_box(table), &config).unwrap())
        });
    }

    group.finish();
}

fn bench_feature_transform(c: &mut Criterion) {
    let table = generate_table(10_000);
    let profile = Profiler::new().profile(&table);
    let fitted = FeaturePipelineBuilder::new(FeatureConfig::default())
        .build(&profile, &["age", "income", "region"])
        .unwrap()
        .fit(&table)
        .unwrap();

    c.bench_function("feature_transform_10000", |b| {
        b.iter(|| fitted.transform(black_box(&table)).unwrap())
    });
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");
    group.sample_size(10);

    let table = generate_table(2_000);
    let profile = Profiler::new().profile(&table);
    let trainer = Trainer::new();

    let forest = TrainingConfig::new("label").with_n_estimators(20);
    group.bench_function("random_forest_20", |b| {
        b.iter(|| trainer.train(black_box(&table), &profile, &forest).unwrap())
    });

    let linear = TrainingConfig::new("label").with_model(ModelFamily::Linear);
    group.bench_function("logistic", |b| {
        b.iter(|| trainer.train(black_box(&table), &profile, &linear).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_profile, bench_clean, bench_feature_transform, bench_train);
criterion_main!(benches);
