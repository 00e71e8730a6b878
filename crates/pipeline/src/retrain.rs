//! Derive the model a session is scored with.
//!
//! Training failures never reach the user: a divergent or otherwise failed
//! retrain is discarded and the baseline is used instead.

use crate::merge::MergedRatings;
use factor_model::{LatentFactorModel, ModelTrainer};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the session model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Trained on the merged ratings
    Retrained,
    /// The session rated nothing; the baseline was reused as-is
    NoSessionRatings,
    /// Retraining failed; the baseline (or a mean-only model) was used
    Fallback,
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModelSource::Retrained => "retrained",
            ModelSource::NoSessionRatings => "baseline (no ratings)",
            ModelSource::Fallback => "baseline (fallback)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    pub model: Arc<LatentFactorModel>,
    pub source: ModelSource,
}

/// Retrain policy for one session.
///
/// - no session ratings + baseline present + `retrain_on_empty_session`
///   false: reuse the baseline
/// - training error: warn and reuse the baseline; without a baseline, use
///   a model that predicts the merged mean
/// - otherwise: the freshly trained model
pub fn retrain_session_model(
    trainer: &ModelTrainer,
    merged: &MergedRatings,
    baseline: Option<&Arc<LatentFactorModel>>,
    retrain_on_empty_session: bool,
) -> RetrainOutcome {
    if merged.new_rows == 0 && !retrain_on_empty_session {
        if let Some(baseline) = baseline {
            info!("No session ratings; reusing baseline model");
            return RetrainOutcome {
                model: Arc::clone(baseline),
                source: ModelSource::NoSessionRatings,
            };
        }
    }

    match trainer.train(&merged.records, baseline.map(Arc::as_ref)) {
        Ok(model) => RetrainOutcome {
            model: Arc::new(model),
            source: ModelSource::Retrained,
        },
        Err(e) => {
            warn!("Retraining failed, falling back to baseline: {}", e);
            let model = match baseline {
                Some(baseline) => Arc::clone(baseline),
                None => Arc::new(mean_only(trainer, merged)),
            };
            RetrainOutcome {
                model,
                source: ModelSource::Fallback,
            }
        }
    }
}

fn mean_only(trainer: &ModelTrainer, merged: &MergedRatings) -> LatentFactorModel {
    let mean = if merged.is_empty() {
        (data_loader::MIN_RATING + data_loader::MAX_RATING) / 2.0
    } else {
        merged.records.iter().map(|r| r.rating).sum::<f32>() / merged.len() as f32
    };
    LatentFactorModel::mean_only(mean, trainer.hyperparameters().n_factors)
}
