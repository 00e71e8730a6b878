//! Benchmarks for model retraining
//!
//! Run with: cargo bench --package factor-model
//!
//! Uses a synthetic corpus shaped like a small MovieLens dump
//! (600 users, 2000 items, ~100k ratings).

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::RatingRecord;
use factor_model::{Hyperparameters, ModelTrainer};

fn synthetic_ratings() -> Vec<RatingRecord> {
    let mut ratings = Vec::new();
    for user_id in 0..600u32 {
        for step in 0..170u32 {
            let item_id = (user_id * 37 + step * 11) % 2000;
            let rating = ((user_id ^ item_id) % 5 + 1) as f32;
            ratings.push(RatingRecord {
                user_id,
                item_id,
                rating,
            });
        }
    }
    ratings
}

fn bench_cold_train(c: &mut Criterion) {
    let ratings = synthetic_ratings();
    let trainer = ModelTrainer::new(Hyperparameters::default().with_n_epochs(5));

    c.bench_function("train_from_scratch_5_epochs", |b| {
        b.iter(|| {
            let model = trainer.train(black_box(&ratings), None).unwrap();
            black_box(model)
        })
    });
}

fn bench_warm_retrain(c: &mut Criterion) {
    let ratings = synthetic_ratings();
    let trainer = ModelTrainer::new(Hyperparameters::default().with_n_epochs(5));
    let baseline = trainer.train(&ratings, None).expect("Failed to train baseline");

    // Five new session ratings in front of the corpus, as a session would add
    let mut merged: Vec<RatingRecord> = (0..5)
        .map(|i| RatingRecord {
            user_id: 1_000_000,
            item_id: i * 100,
            rating: (i % 5 + 1) as f32,
        })
        .collect();
    merged.extend_from_slice(&ratings);

    c.bench_function("session_retrain_5_epochs", |b| {
        b.iter(|| {
            let model = trainer.train(black_box(&merged), Some(&baseline)).unwrap();
            black_box(model)
        })
    });
}

criterion_group!(benches, bench_cold_train, bench_warm_retrain);
criterion_main!(benches);
