//! Stochastic gradient descent for the biased latent-factor model.
//!
//! ## Algorithm
//! 1. Index the users and items of the rating table in first-appearance order
//! 2. Initialize parameters: copied from the baseline when it knows the
//!    user/item (warm start), otherwise zero bias and small seeded factors
//! 3. For each epoch, for each rating `(u, i, r)` in table order:
//!    - `e = r - (mu + b_u + b_i + p_u . q_i)`
//!    - `b_u += lr * (e - reg * b_u)`, `b_i += lr * (e - reg * b_i)`
//!    - `p_u += lr * (e * q_i - reg * p_u)`, `q_i += lr * (e * p_u - reg * q_i)`
//! 4. After every epoch, stop with `Diverged` if any parameter is non-finite
//!
//! Training works on dense vectors and only converts back to id-keyed maps
//! at the end. The baseline is read, never written.

use crate::config::Hyperparameters;
use crate::error::{ModelError, Result};
use crate::model::{LatentFactorModel, dot};
use data_loader::{ItemId, RatingRecord, UserId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, instrument};

/// Fits [`LatentFactorModel`]s with fixed hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    params: Hyperparameters,
}

/// Dense parameter storage for one training run
struct Parameters {
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    /// Row-major, `n_factors` per user
    user_factors: Vec<f32>,
    /// Row-major, `n_factors` per item
    item_factors: Vec<f32>,
}

impl ModelTrainer {
    pub fn new(params: Hyperparameters) -> Self {
        Self { params }
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.params
    }

    /// Fit a new model on `ratings`, warm-starting from `baseline` if given.
    #[instrument(skip_all, fields(ratings = ratings.len(), warm_start = baseline.is_some()))]
    pub fn train(
        &self,
        ratings: &[RatingRecord],
        baseline: Option<&LatentFactorModel>,
    ) -> Result<LatentFactorModel> {
        self.params.validate()?;
        if ratings.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if let Some(found) = baseline
            .map(LatentFactorModel::n_factors)
            .filter(|&found| found != self.params.n_factors)
        {
            return Err(ModelError::DimensionMismatch {
                expected: self.params.n_factors,
                found,
            });
        }

        let k = self.params.n_factors;
        let global_mean = (ratings.iter().map(|r| r.rating as f64).sum::<f64>()
            / ratings.len() as f64) as f32;

        // (user index, item index, rating) in table order
        let (mut params, rows) = self.initialize(ratings, baseline)?;
        debug!(
            "Training {} users x {} items, k={}, mean={:.3}",
            params.user_ids.len(),
            params.item_ids.len(),
            k,
            global_mean
        );

        let lr = self.params.learning_rate;
        let reg = self.params.regularization;

        for epoch in 1..=self.params.n_epochs {
            let mut squared_error = 0.0f64;

            for &(u, i, rating) in &rows {
                let pu = &mut params.user_factors[u * k..(u + 1) * k];
                let qi = &mut params.item_factors[i * k..(i + 1) * k];

                let estimate =
                    global_mean + params.user_bias[u] + params.item_bias[i] + dot(pu, qi);
                let err = rating - estimate;
                squared_error += (err as f64) * (err as f64);

                params.user_bias[u] += lr * (err - reg * params.user_bias[u]);
                params.item_bias[i] += lr * (err - reg * params.item_bias[i]);

                for (puf, qif) in pu.iter_mut().zip(qi.iter_mut()) {
                    let (p, q) = (*puf, *qif);
                    *puf += lr * (err * q - reg * p);
                    *qif += lr * (err * p - reg * q);
                }
            }

            if !params.is_finite() {
                return Err(ModelError::Diverged { epoch });
            }
            debug!(
                "epoch {}/{}: rmse={:.4}",
                epoch,
                self.params.n_epochs,
                (squared_error / rows.len() as f64).sqrt()
            );
        }

        let model = params.into_model(global_mean, k, baseline, self.params);
        let (users, items) = model.counts();
        info!("Trained model: {} users, {} items", users, items);
        Ok(model)
    }

    /// Build the dense index and starting parameters.
    fn initialize(
        &self,
        ratings: &[RatingRecord],
        baseline: Option<&LatentFactorModel>,
    ) -> Result<(Parameters, Vec<(usize, usize, f32)>)> {
        let k = self.params.n_factors;
        let scale = self.params.init_scale;
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<ItemId, usize> = HashMap::new();
        let mut params = Parameters {
            user_ids: Vec::new(),
            item_ids: Vec::new(),
            user_bias: Vec::new(),
            item_bias: Vec::new(),
            user_factors: Vec::new(),
            item_factors: Vec::new(),
        };
        let mut rows = Vec::with_capacity(ratings.len());

        for record in ratings {
            let u = match user_index.entry(record.user_id) {
                Entry::Occupied(slot) => *slot.get(),
                Entry::Vacant(slot) => {
                    let u = params.user_ids.len();
                    slot.insert(u);
                    params.user_ids.push(record.user_id);
                    let warm = baseline.and_then(|b| {
                        Some((b.user_bias(record.user_id)?, b.user_factors(record.user_id)?))
                    });
                    match warm {
                        Some((bias, factors)) => {
                            check_len(factors, k)?;
                            params.user_bias.push(bias);
                            params.user_factors.extend_from_slice(factors);
                        }
                        None => {
                            params.user_bias.push(0.0);
                            params
                                .user_factors
                                .extend((0..k).map(|_| random_factor(&mut rng, scale)));
                        }
                    }
                    u
                }
            };

            let i = match item_index.entry(record.item_id) {
                Entry::Occupied(slot) => *slot.get(),
                Entry::Vacant(slot) => {
                    let i = params.item_ids.len();
                    slot.insert(i);
                    params.item_ids.push(record.item_id);
                    let warm = baseline.and_then(|b| {
                        Some((b.item_bias(record.item_id)?, b.item_factors(record.item_id)?))
                    });
                    match warm {
                        Some((bias, factors)) => {
                            check_len(factors, k)?;
                            params.item_bias.push(bias);
                            params.item_factors.extend_from_slice(factors);
                        }
                        None => {
                            params.item_bias.push(0.0);
                            params
                                .item_factors
                                .extend((0..k).map(|_| random_factor(&mut rng, scale)));
                        }
                    }
                    i
                }
            };

            rows.push((u, i, record.rating));
        }

        Ok((params, rows))
    }
}

/// Warm-start vectors must match the dense layout exactly.
fn check_len(factors: &[f32], k: usize) -> Result<()> {
    if factors.len() == k {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            expected: k,
            found: factors.len(),
        })
    }
}

fn random_factor(rng: &mut ChaCha8Rng, scale: f32) -> f32 {
    if scale == 0.0 {
        0.0
    } else {
        rng.random_range(-scale..=scale)
    }
}

impl Parameters {
    fn is_finite(&self) -> bool {
        self.user_bias
            .iter()
            .chain(&self.item_bias)
            .chain(&self.user_factors)
            .chain(&self.item_factors)
            .all(|v| v.is_finite())
    }

    /// Convert back to id-keyed maps. Baseline entries that were not part of
    /// this run are carried over unchanged.
    fn into_model(
        self,
        global_mean: f32,
        k: usize,
        baseline: Option<&LatentFactorModel>,
        hyperparameters: Hyperparameters,
    ) -> LatentFactorModel {
        let mut model = match baseline {
            Some(baseline) => LatentFactorModel {
                global_mean,
                hyperparameters: Some(hyperparameters),
                ..baseline.clone()
            },
            None => LatentFactorModel {
                hyperparameters: Some(hyperparameters),
                ..LatentFactorModel::mean_only(global_mean, k)
            },
        };

        for (u, &user_id) in self.user_ids.iter().enumerate() {
            model.user_bias.insert(user_id, self.user_bias[u]);
            model
                .user_factors
                .insert(user_id, self.user_factors[u * k..(u + 1) * k].to_vec());
        }
        for (i, &item_id) in self.item_ids.iter().enumerate() {
            model.item_bias.insert(item_id, self.item_bias[i]);
            model
                .item_factors
                .insert(item_id, self.item_factors[i * k..(i + 1) * k].to_vec());
        }
        model
    }
}
