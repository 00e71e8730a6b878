//! The biased latent-factor model.
//!
//! `r_hat(u, i) = mu + b_u + b_i + p_u . q_i`
//!
//! Users and items the model has never seen contribute no bias and no
//! factor term, so a brand-new user is scored by `mu + b_i`.

use crate::config::Hyperparameters;
use crate::error::{ModelError, Result};
use data_loader::{ItemId, MAX_RATING, MIN_RATING, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentFactorModel {
    pub(crate) global_mean: f32,
    pub(crate) n_factors: usize,
    pub(crate) user_bias: HashMap<UserId, f32>,
    pub(crate) item_bias: HashMap<ItemId, f32>,
    pub(crate) user_factors: HashMap<UserId, Vec<f32>>,
    pub(crate) item_factors: HashMap<ItemId, Vec<f32>>,
    /// How the model was trained, if it was trained here
    #[serde(default)]
    pub(crate) hyperparameters: Option<Hyperparameters>,
}

impl LatentFactorModel {
    /// A model that predicts `global_mean` for everything.
    ///
    /// Used as the last-resort fallback when there is no baseline to fall
    /// back to.
    pub fn mean_only(global_mean: f32, n_factors: usize) -> Self {
        Self {
            global_mean,
            n_factors,
            user_bias: HashMap::new(),
            item_bias: HashMap::new(),
            user_factors: HashMap::new(),
            item_factors: HashMap::new(),
            hyperparameters: None,
        }
    }

    /// Assemble a model from explicit parameters.
    ///
    /// Every factor vector must have length `n_factors`.
    pub fn from_parts(
        global_mean: f32,
        n_factors: usize,
        user_bias: HashMap<UserId, f32>,
        item_bias: HashMap<ItemId, f32>,
        user_factors: HashMap<UserId, Vec<f32>>,
        item_factors: HashMap<ItemId, Vec<f32>>,
    ) -> Result<Self> {
        let model = Self {
            global_mean,
            n_factors,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
            hyperparameters: None,
        };
        model.validate_dimensions()?;
        Ok(model)
    }

    /// Check that every factor vector has length `n_factors`.
    pub fn validate_dimensions(&self) -> Result<()> {
        let bad_len = self
            .user_factors
            .values()
            .chain(self.item_factors.values())
            .map(Vec::len)
            .find(|&len| len != self.n_factors);
        match bad_len {
            Some(found) => Err(ModelError::DimensionMismatch {
                expected: self.n_factors,
                found,
            }),
            None => Ok(()),
        }
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn hyperparameters(&self) -> Option<&Hyperparameters> {
        self.hyperparameters.as_ref()
    }

    pub fn user_bias(&self, user_id: UserId) -> Option<f32> {
        self.user_bias.get(&user_id).copied()
    }

    pub fn item_bias(&self, item_id: ItemId) -> Option<f32> {
        self.item_bias.get(&item_id).copied()
    }

    pub fn user_factors(&self, user_id: UserId) -> Option<&[f32]> {
        self.user_factors.get(&user_id).map(Vec::as_slice)
    }

    pub fn item_factors(&self, item_id: ItemId) -> Option<&[f32]> {
        self.item_factors.get(&item_id).map(Vec::as_slice)
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.user_bias.contains_key(&user_id)
    }

    pub fn knows_item(&self, item_id: ItemId) -> bool {
        self.item_bias.contains_key(&item_id)
    }

    /// (users, items) the model holds parameters for
    pub fn counts(&self) -> (usize, usize) {
        (self.user_bias.len(), self.item_bias.len())
    }

    /// Raw estimate, not clipped to the rating scale.
    pub fn estimate(&self, user_id: UserId, item_id: ItemId) -> f32 {
        let mut estimate = self.global_mean;
        estimate += self.user_bias(user_id).unwrap_or(0.0);
        estimate += self.item_bias(item_id).unwrap_or(0.0);
        if let (Some(pu), Some(qi)) = (self.user_factors(user_id), self.item_factors(item_id)) {
            estimate += dot(pu, qi);
        }
        estimate
    }

    /// Estimate clipped to `[MIN_RATING, MAX_RATING]`.
    pub fn predict(&self, user_id: UserId, item_id: ItemId) -> f32 {
        clip_rating(self.estimate(user_id, item_id))
    }

    /// True when every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.global_mean.is_finite()
            && self.user_bias.values().all(|b| b.is_finite())
            && self.item_bias.values().all(|b| b.is_finite())
            && self.user_factors.values().flatten().all(|f| f.is_finite())
            && self.item_factors.values().flatten().all(|f| f.is_finite())
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Clip a score to the rating scale. NaN maps to the lowest rating.
pub fn clip_rating(score: f32) -> f32 {
    if score.is_nan() {
        return MIN_RATING;
    }
    score.clamp(MIN_RATING, MAX_RATING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> LatentFactorModel {
        LatentFactorModel::from_parts(
            3.0,
            2,
            HashMap::from([(1, 0.5)]),
            HashMap::from([(10, 0.25), (11, -0.5)]),
            HashMap::from([(1, vec![1.0, 2.0])]),
            HashMap::from([(10, vec![0.5, 0.5]), (11, vec![0.0, -0.25])]),
        )
        .unwrap()
    }

    #[test]
    fn test_estimate_known_pair() {
        let model = toy_model();
        // 3.0 + 0.5 + 0.25 + (0.5 + 1.0)
        assert!((model.estimate(1, 10) - 5.25).abs() < 1e-6);
        assert_eq!(model.predict(1, 10), MAX_RATING);
    }

    #[test]
    fn test_unknown_user_and_item_fall_back_to_biases() {
        let model = toy_model();
        assert!((model.estimate(99, 11) - 2.5).abs() < 1e-6);
        assert!((model.estimate(1, 99) - 3.5).abs() < 1e-6);
        assert!((model.estimate(99, 99) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_parts_checks_dimensions() {
        let err = LatentFactorModel::from_parts(
            3.0,
            3,
            HashMap::new(),
            HashMap::new(),
            HashMap::from([(1, vec![1.0])]),
            HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn test_clip_rating() {
        assert_eq!(clip_rating(-2.0), 1.0);
        assert_eq!(clip_rating(3.3), 3.3);
        assert_eq!(clip_rating(9.0), 5.0);
        assert_eq!(clip_rating(f32::NAN), 1.0);
    }

    #[test]
    fn test_is_finite() {
        let mut model = toy_model();
        assert!(model.is_finite());
        model.item_factors.insert(12, vec![f32::INFINITY, 0.0]);
        assert!(!model.is_finite());
    }
}
