//! Score every genre-filtered item for the session user.

use crate::session::SessionUser;
use data_loader::ItemId;
use factor_model::LatentFactorModel;
use rayon::prelude::*;
use tracing::debug;

/// A predicted rating for one item, on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub item_id: ItemId,
    pub score: f32,
}

pub struct Predictor<'a> {
    model: &'a LatentFactorModel,
}

impl<'a> Predictor<'a> {
    pub fn new(model: &'a LatentFactorModel) -> Self {
        Self { model }
    }

    /// One prediction per id, in input order, clipped to the rating scale.
    ///
    /// Items the model never saw are scored from the global mean and the
    /// user's bias only.
    pub fn predict(&self, user: SessionUser, item_ids: &[ItemId]) -> Vec<Prediction> {
        let predictions: Vec<Prediction> = item_ids
            .par_iter()
            .map(|&item_id| Prediction {
                item_id,
                score: self.model.predict(user.id(), item_id),
            })
            .collect();

        let cold = item_ids.iter().filter(|&&id| !self.model.knows_item(id)).count();
        debug!(
            "Predicted {} items for {} ({} unseen by the model)",
            predictions.len(),
            user,
            cold
        );
        predictions
    }
}
