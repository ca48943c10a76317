use aqi_forecast::data::Reading;
use aqi_forecast::features::FeatureBuilder;
use aqi_forecast::training::{
    CandidateSpec, GradientBoostingConfig, ModelTrainer, RandomForestConfig, TrainingConfig, XGBoostConfig,
};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_readings(n: usize) -> Vec<Reading> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    (0..n)
        .map(|i| {
            let daily = 30.0 * ((i % 24) as f64 / 24.0 * std::f64::consts::TAU).sin();
            let aqi = 100.0 + daily + rng.gen::<f64>() * 15.0;
            Reading::new(start + Duration::hours(i as i64), aqi).with_pollutants([
                Some(aqi / 1.5),
                Some(aqi * 0.8 + rng.gen::<f64>() * 5.0),
                Some(10.0 + rng.gen::<f64>() * 20.0),
                Some(2.0 + rng.gen::<f64>() * 4.0),
                Some(200.0 + rng.gen::<f64>() * 150.0),
            ])
        })
        .collect()
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    for n in [720, 2160, 8760].iter() {
        let readings = create_readings(*n);
        group.bench_with_input(BenchmarkId::new("build", n), &readings, |b, readings| {
            b.iter(|| FeatureBuilder::default().build(black_box(readings)))
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    // Thirty days of hourly history, the default backfill
    let df = FeatureBuilder::default().build_frame(&create_readings(720)).unwrap();

    let candidates = [
        ("random_forest", CandidateSpec::RandomForest(RandomForestConfig { n_estimators: 50, ..Default::default() })),
        ("xgboost", CandidateSpec::XGBoost(XGBoostConfig { n_estimators: 50, ..Default::default() })),
        (
            "gradient_boosting",
            CandidateSpec::GradientBoosting(GradientBoostingConfig { n_estimators: 50, ..Default::default() }),
        ),
    ];

    for (name, spec) in candidates {
        let trainer = ModelTrainer::new(TrainingConfig::default().with_candidates(vec![spec]));
        group.bench_with_input(BenchmarkId::new("fit", name), &df, |b, df| {
            b.iter(|| trainer.train(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_features, bench_training);
criterion_main!(benches);
