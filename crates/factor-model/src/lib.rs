//! # Factor Model Crate
//!
//! A biased matrix-factorization ("SVD"-style) rating model and the SGD
//! trainer that fits it.
//!
//! ## Components
//!
//! - **model**: `LatentFactorModel` (global mean, user/item biases, user/item factors)
//! - **trainer**: `ModelTrainer`, warm-started from a baseline model
//! - **config**: `Hyperparameters`
//! - **persist**: JSON load/save for baseline models
//!
//! ## Example Usage
//!
//! ```ignore
//! use factor_model::{Hyperparameters, ModelTrainer};
//!
//! let trainer = ModelTrainer::new(Hyperparameters::default());
//! let baseline = trainer.train(&historical, None)?;
//! let session_model = trainer.train(&merged, Some(&baseline))?;
//! let score = session_model.predict(session_user, item_id);
//! ```
//!
//! Training never mutates its baseline; every call returns a fresh model.

pub mod config;
pub mod error;
pub mod model;
pub mod persist;
pub mod trainer;

pub use config::{DEFAULT_TRAINING_SEED, Hyperparameters};
pub use error::{ModelError, Result};
pub use model::{LatentFactorModel, clip_rating};
pub use trainer::ModelTrainer;
