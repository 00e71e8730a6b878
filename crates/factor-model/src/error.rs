//! Error types for training, scoring and persisting latent-factor models.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Training was asked to fit zero ratings
    #[error("Cannot train on an empty rating set")]
    EmptyTrainingSet,

    /// A warm-start model has a different factor dimensionality
    #[error("Factor dimension mismatch: configured {expected}, baseline has {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A bias or factor became NaN or infinite
    #[error("Training diverged at epoch {epoch}: non-finite parameter")]
    Diverged { epoch: usize },

    #[error("Invalid hyperparameter {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
