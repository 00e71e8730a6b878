//! Filter to keep only catalog items of the session's genre.
//!
//! Predictions are normally made for the genre-filtered set already; this
//! filter makes the ranker safe against callers that pass other ids.

use crate::predictor::Prediction;
use crate::session::SessionContext;
use crate::traits::Filter;
use anyhow::Result;
use data_loader::Catalog;
use std::sync::Arc;

/// Drops predictions whose item is missing from the catalog or does not
/// carry the session genre.
pub struct GenreMembershipFilter {
    catalog: Arc<Catalog>,
}

impl GenreMembershipFilter {
    /// Create a new GenreMembershipFilter.
    ///
    /// # Arguments
    /// * `catalog` - Shared reference to the catalog for genre lookups
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Filter for GenreMembershipFilter {
    fn name(&self) -> &str {
        "GenreMembershipFilter"
    }

    fn apply(
        &self,
        predictions: Vec<Prediction>,
        context: &SessionContext,
    ) -> Result<Vec<Prediction>> {
        let filtered: Vec<Prediction> = predictions
            .into_iter()
            .filter(|prediction| {
                self.catalog
                    .get(prediction.item_id)
                    .is_some_and(|item| item.has_genre(context.genre))
            })
            .collect();
        Ok(filtered)
    }
}
