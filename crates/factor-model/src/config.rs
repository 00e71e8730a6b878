//! Training hyperparameters.
//!
//! Fixed per process: they come from `Default` or the CLI, never from a
//! session request.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Seed for factor initialization
pub const DEFAULT_TRAINING_SEED: u64 = 111;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Latent factor dimensionality `k`
    pub n_factors: usize,
    /// Passes over the full rating table
    pub n_epochs: usize,
    /// SGD step size
    pub learning_rate: f32,
    /// L2 penalty applied to biases and factors
    pub regularization: f32,
    /// New factors are drawn from `[-init_scale, init_scale]`
    pub init_scale: f32,
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_factors: 100,
            n_epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_scale: 0.1,
            seed: DEFAULT_TRAINING_SEED,
        }
    }
}

impl Hyperparameters {
    pub fn with_n_factors(mut self, n_factors: usize) -> Self {
        self.n_factors = n_factors;
        self
    }

    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_init_scale(mut self, init_scale: f32) -> Self {
        self.init_scale = init_scale;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values SGD cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.n_factors == 0 {
            return Err(invalid("n_factors", self.n_factors));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", self.learning_rate));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(invalid("regularization", self.regularization));
        }
        if !(self.init_scale.is_finite() && self.init_scale >= 0.0) {
            return Err(invalid("init_scale", self.init_scale));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ModelError {
    ModelError::InvalidHyperparameter {
        name,
        value: value.to_string(),
    }
}
